//! Drug pricing and prescribing analyses.
//!
//! Joins admitted claims against the pharmacy directory to recommend the
//! cheapest chains per drug and to find the most commonly prescribed
//! quantities per drug.

use std::collections::{BTreeMap, HashMap};

use claims_core::formatting::round_currency;
use claims_core::models::{
    ChainPrice, ChainRecommendation, Claim, PharmacyDirectory, QuantityProfile,
};
use tracing::debug;

/// Chains reported per drug.
pub const DEFAULT_MAX_CHAINS: usize = 2;

/// Quantities reported per drug.
pub const DEFAULT_MAX_QUANTITIES: usize = 5;

// ── Accumulators ──────────────────────────────────────────────────────────────

/// Sum and count of unit prices for one (drug, chain) group.
#[derive(Debug, Clone, Copy, Default)]
struct PriceTally {
    sum: f64,
    count: u64,
}

impl PriceTally {
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Quantity frequencies for one drug, in first-seen order.
#[derive(Debug, Default)]
struct QuantityTally {
    counts: Vec<(i64, u64)>,
    index: HashMap<i64, usize>,
}

impl QuantityTally {
    fn add(&mut self, quantity: i64) {
        match self.index.get(&quantity) {
            Some(&pos) => self.counts[pos].1 += 1,
            None => {
                self.index.insert(quantity, self.counts.len());
                self.counts.push((quantity, 1));
            }
        }
    }

    /// The `limit` most frequent quantities. The sort is stable, so equal
    /// frequencies keep first-seen order.
    fn top(mut self, limit: usize) -> Vec<i64> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
            .into_iter()
            .take(limit)
            .map(|(quantity, _)| quantity)
            .collect()
    }
}

// ── ClaimAnalyzer ─────────────────────────────────────────────────────────────

/// Builds the per-drug reports from admitted claims.
pub struct ClaimAnalyzer<'a> {
    pharmacies: &'a PharmacyDirectory,
    max_chains: usize,
    max_quantities: usize,
}

impl<'a> ClaimAnalyzer<'a> {
    /// Create an analyser with the default report sizes.
    pub fn new(pharmacies: &'a PharmacyDirectory) -> Self {
        Self::with_limits(pharmacies, DEFAULT_MAX_CHAINS, DEFAULT_MAX_QUANTITIES)
    }

    /// Create an analyser reporting at most `max_chains` chains and
    /// `max_quantities` quantities per drug.
    pub fn with_limits(
        pharmacies: &'a PharmacyDirectory,
        max_chains: usize,
        max_quantities: usize,
    ) -> Self {
        Self {
            pharmacies,
            max_chains,
            max_quantities,
        }
    }

    /// Recommend the cheapest chains for each drug.
    ///
    /// Chains are ranked by their mean unit price for the drug, ascending;
    /// equal means are ordered by chain name. Claims whose pharmacy is not in
    /// the directory are ignored. The report is sorted by `ndc`.
    pub fn recommend_chains(&self, claims: &[Claim]) -> Vec<ChainRecommendation> {
        let mut groups: BTreeMap<&str, HashMap<&str, PriceTally>> = BTreeMap::new();

        for claim in claims {
            let Some(chain) = self.pharmacies.chain_for(&claim.npi) else {
                continue;
            };
            let tally = groups
                .entry(claim.ndc.as_str())
                .or_default()
                .entry(chain)
                .or_default();
            tally.sum += claim.unit_price();
            tally.count += 1;
        }

        let report: Vec<ChainRecommendation> = groups
            .into_iter()
            .map(|(ndc, chains)| {
                let mut ranked: Vec<(&str, f64)> = chains
                    .into_iter()
                    .map(|(name, tally)| (name, tally.mean()))
                    .collect();
                ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

                ChainRecommendation {
                    ndc: ndc.to_string(),
                    chain: ranked
                        .into_iter()
                        .take(self.max_chains)
                        .map(|(name, mean)| ChainPrice {
                            name: name.to_string(),
                            avg_price: round_currency(mean),
                        })
                        .collect(),
                }
            })
            .collect();

        debug!("ClaimAnalyzer: chain recommendations for {} drugs", report.len());
        report
    }

    /// The most commonly prescribed quantities for each drug, most frequent
    /// first.
    ///
    /// Equal frequencies keep the order in which the quantities were first
    /// seen in `claims`. Claims whose pharmacy is not in the directory are
    /// ignored. The report is sorted by `ndc`.
    pub fn most_prescribed_quantities(&self, claims: &[Claim]) -> Vec<QuantityProfile> {
        let mut groups: BTreeMap<&str, QuantityTally> = BTreeMap::new();

        for claim in claims {
            if !self.pharmacies.contains(&claim.npi) {
                continue;
            }
            groups
                .entry(claim.ndc.as_str())
                .or_default()
                .add(claim.quantity);
        }

        let report: Vec<QuantityProfile> = groups
            .into_iter()
            .map(|(ndc, tally)| QuantityProfile {
                ndc: ndc.to_string(),
                most_prescribed_quantity: tally.top(self.max_quantities),
            })
            .collect();

        debug!("ClaimAnalyzer: quantity profiles for {} drugs", report.len());
        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
