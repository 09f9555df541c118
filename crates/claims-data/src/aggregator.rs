//! Per-pharmacy, per-drug fill metrics.
//!
//! Groups admitted claims by `(npi, ndc)`, marks claims referenced by an
//! admitted revert and produces one [`MetricRecord`] per key.

use std::collections::{BTreeMap, HashSet};

use claims_core::formatting::round_currency;
use claims_core::models::{Claim, MetricRecord, Revert};
use tracing::info;

// ── MetricAccumulator ─────────────────────────────────────────────────────────

/// Running totals for one `(npi, ndc)` key.
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    pub fills: u64,
    pub reverted: u64,
    pub total_price: f64,
    /// Unit price of every claim added so far.
    pub unit_prices: Vec<f64>,
}

impl MetricAccumulator {
    /// Add one claim to the running totals.
    pub fn add_claim(&mut self, claim: &Claim, is_reverted: bool) {
        self.fills += 1;
        self.total_price += claim.price;
        self.unit_prices.push(claim.unit_price());
        if is_reverted {
            self.reverted += 1;
        }
    }

    /// Arithmetic mean of the collected unit prices, `0.0` when empty.
    pub fn average_unit_price(&self) -> f64 {
        if self.unit_prices.is_empty() {
            return 0.0;
        }
        self.unit_prices.iter().sum::<f64>() / self.unit_prices.len() as f64
    }

    fn finalize(self, npi: String, ndc: String) -> MetricRecord {
        MetricRecord {
            avg_price: round_currency(self.average_unit_price()),
            total_price: round_currency(self.total_price),
            npi,
            ndc,
            fills: self.fills,
            reverted: self.reverted,
        }
    }
}

// ── MetricsAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that turns admitted claims and reverts into metrics.
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Compute fill metrics grouped by `(npi, ndc)`.
    ///
    /// Returns one record per distinct key, sorted by `npi` then `ndc`.
    pub fn calculate_metrics(claims: &[Claim], reverts: &[Revert]) -> Vec<MetricRecord> {
        info!("Calculating metrics...");

        let reverted_ids = Self::reverted_claim_ids(reverts);

        // BTreeMap keeps the keys ordered for output.
        let mut groups: BTreeMap<(String, String), MetricAccumulator> = BTreeMap::new();
        for claim in claims {
            groups
                .entry((claim.npi.clone(), claim.ndc.clone()))
                .or_default()
                .add_claim(claim, reverted_ids.contains(claim.id.as_str()));
        }

        let metrics: Vec<MetricRecord> = groups
            .into_iter()
            .map(|((npi, ndc), acc)| acc.finalize(npi, ndc))
            .collect();

        info!(
            "Calculated metrics for {} npi/ndc combinations",
            metrics.len()
        );
        metrics
    }

    /// Claim ids referenced by at least one revert.
    pub fn reverted_claim_ids(reverts: &[Revert]) -> HashSet<&str> {
        reverts.iter().map(|r| r.claim_id.as_str()).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
