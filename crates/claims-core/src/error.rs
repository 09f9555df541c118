use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the claims pipeline.
#[derive(Error, Debug)]
pub enum ClaimsError {
    /// An input directory does not exist or is not a directory.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON in {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV in {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A JSON document was neither an object nor an array of objects.
    #[error("Unexpected document in {path}: expected object or array, found {found}")]
    UnexpectedDocument { path: PathBuf, found: &'static str },

    /// A CSV header row lacks one or more required columns.
    #[error("Missing required columns in {path}: {columns}")]
    MissingColumns { path: PathBuf, columns: String },

    /// A report file could not be written.
    #[error("Failed to write output {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report could not be serialized.
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClaimsError {
    /// `true` for errors scoped to a single input file. The loader logs these
    /// and moves on to the next file; everything else aborts the run.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            ClaimsError::FileRead { .. }
                | ClaimsError::JsonParse { .. }
                | ClaimsError::CsvParse { .. }
                | ClaimsError::UnexpectedDocument { .. }
                | ClaimsError::MissingColumns { .. }
        )
    }
}

/// Convenience alias used throughout the claims crates.
pub type Result<T> = std::result::Result<T, ClaimsError>;
