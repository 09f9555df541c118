mod bootstrap;

use anyhow::{Context, Result};
use claims_core::settings::Settings;
use claims_data::analysis::{run_pipeline, PipelineInputs};
use claims_data::writer::write_reports;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Pharmacy claims v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Revert admission: {}", settings.revert_admission);

    if let Err(e) = run(&settings) {
        tracing::error!("Error during processing: {:#}", e);
        return Err(e);
    }

    tracing::info!("Processing completed successfully!");
    Ok(())
}

/// Load, compute and write. Nothing is written unless every report was
/// computed.
fn run(settings: &Settings) -> Result<()> {
    settings.validate()?;

    let output = run_pipeline(&PipelineInputs::from(settings))?;

    let paths = write_reports(&settings.output, &output)
        .with_context(|| format!("failed to write reports to {}", settings.output.display()))?;

    let summary = &output.summary;
    tracing::info!(
        "Wrote {} metric rows to {}",
        summary.metric_rows,
        paths.metrics.display()
    );
    tracing::info!(
        "Wrote {} chain recommendations to {}",
        summary.chain_recommendations,
        paths.chain_recommendations.display()
    );
    tracing::info!(
        "Wrote {} quantity profiles to {}",
        summary.quantity_profiles,
        paths.quantity_profiles.display()
    );
    match serde_json::to_string(summary) {
        Ok(json) => tracing::debug!("Run summary: {}", json),
        Err(e) => tracing::debug!("Run summary not serializable: {}", e),
    }

    Ok(())
}
