//! Main processing pipeline.
//!
//! Loads pharmacies, claims and reverts, then computes the metrics report and
//! both per-drug analyses, returning a [`PipelineOutput`] ready to be written.

use std::path::PathBuf;

use chrono::Utc;
use claims_core::error::Result;
use claims_core::models::{ChainRecommendation, MetricRecord, QuantityProfile, RevertAdmission};
use claims_core::settings::Settings;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregator::MetricsAggregator;
use crate::analyzer::ClaimAnalyzer;
use crate::reader::{load_claims, load_pharmacies, load_reverts, LoadReport};

// ── Public types ──────────────────────────────────────────────────────────────

/// Input locations and policy for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub pharmacy_dir: PathBuf,
    pub claims_dir: PathBuf,
    pub reverts_dir: PathBuf,
    pub revert_admission: RevertAdmission,
}

impl From<&Settings> for PipelineInputs {
    fn from(s: &Settings) -> Self {
        PipelineInputs {
            pharmacy_dir: s.pharmacy_dir.clone(),
            claims_dir: s.claims_dir.clone(),
            reverts_dir: s.reverts_dir.clone(),
            revert_admission: s.revert_admission,
        }
    }
}

/// Metadata produced alongside the reports.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Revert admission policy in effect.
    pub revert_admission: RevertAdmission,
    pub pharmacies: LoadReport,
    pub claims: LoadReport,
    pub reverts: LoadReport,
    /// Distinct NPIs in the pharmacy directory.
    pub known_pharmacies: usize,
    pub metric_rows: usize,
    pub chain_recommendations: usize,
    pub quantity_profiles: usize,
    /// Sum of `total_price` over all metric rows.
    pub total_billed: f64,
    /// Wall-clock seconds spent loading input files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent computing the reports.
    pub compute_time_seconds: f64,
}

/// The complete output of [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub metrics: Vec<MetricRecord>,
    pub chain_recommendations: Vec<ChainRecommendation>,
    pub quantity_profiles: Vec<QuantityProfile>,
    pub summary: PipelineSummary,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline.
///
/// 1. Load the pharmacy directory.
/// 2. Load claims, keeping those for known pharmacies.
/// 3. Load reverts under the configured admission policy.
/// 4. Compute metrics, chain recommendations and quantity profiles.
///
/// A missing input directory aborts the run; nothing is computed or
/// written in that case.
pub fn run_pipeline(inputs: &PipelineInputs) -> Result<PipelineOutput> {
    if inputs.revert_admission == RevertAdmission::Legacy {
        warn!("Legacy revert admission: every revert is rejected and reverted counts will be 0");
    }

    // ── Step 1-3: Load ────────────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let (pharmacies, pharmacy_report) = load_pharmacies(&inputs.pharmacy_dir)?;
    let (claims, claim_report) = load_claims(&inputs.claims_dir, &pharmacies)?;
    let (reverts, revert_report) = load_reverts(&inputs.reverts_dir, inputs.revert_admission)?;
    let load_time = load_start.elapsed().as_secs_f64();

    // ── Step 4: Reports ───────────────────────────────────────────────────────
    let compute_start = std::time::Instant::now();
    let metrics = MetricsAggregator::calculate_metrics(&claims, &reverts);
    let analyzer = ClaimAnalyzer::new(&pharmacies);
    let chain_recommendations = analyzer.recommend_chains(&claims);
    let quantity_profiles = analyzer.most_prescribed_quantities(&claims);
    let compute_time = compute_start.elapsed().as_secs_f64();

    let total_billed: f64 = metrics.iter().map(|m| m.total_price).sum();

    let summary = PipelineSummary {
        generated_at: Utc::now().to_rfc3339(),
        revert_admission: inputs.revert_admission,
        pharmacies: pharmacy_report,
        claims: claim_report,
        reverts: revert_report,
        known_pharmacies: pharmacies.len(),
        metric_rows: metrics.len(),
        chain_recommendations: chain_recommendations.len(),
        quantity_profiles: quantity_profiles.len(),
        total_billed,
        load_time_seconds: load_time,
        compute_time_seconds: compute_time,
    };

    info!(
        "Processed {} claims across {} npi/ndc combinations, ${:.2} billed",
        summary.claims.records_admitted,
        summary.metric_rows,
        total_billed,
    );

    Ok(PipelineOutput {
        metrics,
        chain_recommendations,
        quantity_profiles,
        summary,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
