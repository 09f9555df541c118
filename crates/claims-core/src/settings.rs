use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{ClaimsError, Result};
use crate::models::RevertAdmission;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Pharmacy claim metrics and drug pricing reports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pharmacy-claims",
    about = "Pharmacy claim metrics and drug pricing reports",
    version
)]
pub struct Settings {
    /// Directory containing pharmacy CSV files
    #[arg(long, value_name = "DIR")]
    pub pharmacy_dir: PathBuf,

    /// Directory containing claim JSON files
    #[arg(long, value_name = "DIR")]
    pub claims_dir: PathBuf,

    /// Directory containing revert JSON files
    #[arg(long, value_name = "DIR")]
    pub reverts_dir: PathBuf,

    /// Directory the report files are written to (created if missing)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: PathBuf,

    /// How revert records are admitted ("legacy" rejects every revert)
    #[arg(long, value_enum, default_value_t = RevertAdmission::Validate)]
    pub revert_admission: RevertAdmission,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Also append log output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and resolve derived values.
    ///
    /// Exits with a usage error when a required argument is missing.
    pub fn load() -> Self {
        Settings::parse().resolve()
    }

    /// Parse an explicit argument list, returning clap's error instead of
    /// exiting. Used by tests.
    pub fn load_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Settings::resolve)
    }

    /// Apply the `--debug` flag.
    pub fn resolve(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Check the output location before any work is done.
    ///
    /// The output path must be a directory or not exist yet.
    pub fn validate(&self) -> Result<()> {
        if self.output.exists() && !self.output.is_dir() {
            return Err(ClaimsError::Config(format!(
                "output path {} exists and is not a directory",
                self.output.display()
            )));
        }
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
