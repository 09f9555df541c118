//! JSON report output.

use std::path::{Path, PathBuf};

use claims_core::error::{ClaimsError, Result};
use serde::Serialize;
use tracing::info;

use crate::analysis::PipelineOutput;

pub const METRICS_FILE: &str = "metrics.json";
pub const CHAIN_RECOMMENDATIONS_FILE: &str = "chain_recommendations.json";
pub const QUANTITY_PROFILES_FILE: &str = "quantity_profiles.json";

/// Where each report was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub metrics: PathBuf,
    pub chain_recommendations: PathBuf,
    pub quantity_profiles: PathBuf,
}

impl ReportPaths {
    /// Report locations inside `output_dir`.
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            metrics: output_dir.join(METRICS_FILE),
            chain_recommendations: output_dir.join(CHAIN_RECOMMENDATIONS_FILE),
            quantity_profiles: output_dir.join(QUANTITY_PROFILES_FILE),
        }
    }
}

/// Write the three reports into `output_dir`, creating it if needed.
pub fn write_reports(output_dir: &Path, output: &PipelineOutput) -> Result<ReportPaths> {
    std::fs::create_dir_all(output_dir).map_err(|source| ClaimsError::OutputWrite {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let paths = ReportPaths::in_dir(output_dir);
    write_json_report(&paths.metrics, &output.metrics)?;
    write_json_report(&paths.chain_recommendations, &output.chain_recommendations)?;
    write_json_report(&paths.quantity_profiles, &output.quantity_profiles)?;
    Ok(paths)
}

/// Pretty-print `value` as JSON to `path`.
///
/// The document is written to a sibling temp file and renamed into place, so
/// readers never see a half-written report. Non-ASCII text is written as
/// UTF-8, not escaped.
pub fn write_json_report<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    info!("Saving results to {}", path.display());

    let json = serde_json::to_string_pretty(value)?;
    let write_error = |source: std::io::Error| ClaimsError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_error)?;
    std::fs::rename(&tmp, path).map_err(write_error)?;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
