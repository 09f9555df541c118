use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How revert records are admitted by the validator.
///
/// The legacy validator never returned a positive result, so no revert was
/// ever admitted and every `reverted` count came out as zero. `Validate` is
/// the corrected behavior; `Legacy` reproduces the old output for consumers
/// that depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RevertAdmission {
    /// Admit a revert when `id`, `claim_id` and `timestamp` are all present.
    #[default]
    Validate,
    /// Reject every revert.
    Legacy,
}

impl std::fmt::Display for RevertAdmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevertAdmission::Validate => f.write_str("validate"),
            RevertAdmission::Legacy => f.write_str("legacy"),
        }
    }
}

/// A pharmacy reference row: NPI → chain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pharmacy {
    pub npi: String,
    pub chain: String,
}

/// Known pharmacies keyed by NPI.
///
/// Inserting an NPI that is already present replaces its chain
/// (last write wins).
#[derive(Debug, Clone, Default)]
pub struct PharmacyDirectory {
    chains: HashMap<String, String>,
}

impl PharmacyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a pharmacy.
    pub fn insert(&mut self, pharmacy: Pharmacy) {
        self.chains.insert(pharmacy.npi, pharmacy.chain);
    }

    /// Chain name for `npi`, if the pharmacy is known.
    pub fn chain_for(&self, npi: &str) -> Option<&str> {
        self.chains.get(npi).map(String::as_str)
    }

    pub fn contains(&self, npi: &str) -> bool {
        self.chains.contains_key(npi)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Extend<Pharmacy> for PharmacyDirectory {
    fn extend<I: IntoIterator<Item = Pharmacy>>(&mut self, iter: I) {
        for pharmacy in iter {
            self.insert(pharmacy);
        }
    }
}

impl FromIterator<Pharmacy> for PharmacyDirectory {
    fn from_iter<I: IntoIterator<Item = Pharmacy>>(iter: I) -> Self {
        let mut directory = Self::new();
        directory.extend(iter);
        directory
    }
}

/// A validated pharmacy claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique claim identifier.
    pub id: String,
    /// NPI of the dispensing pharmacy.
    pub npi: String,
    /// National drug code.
    pub ndc: String,
    /// Total price paid for the fill.
    pub price: f64,
    /// Units dispensed.
    pub quantity: i64,
    /// Claim timestamp as found in the source record.
    pub timestamp: String,
}

impl Claim {
    /// Price per unit; zero when the quantity is not positive.
    pub fn unit_price(&self) -> f64 {
        if self.quantity > 0 {
            self.price / self.quantity as f64
        } else {
            0.0
        }
    }
}

/// A validated revert referencing a previously submitted claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revert {
    pub id: String,
    pub claim_id: String,
    pub timestamp: String,
}

/// Per-(NPI, NDC) fill metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub npi: String,
    pub ndc: String,
    /// Number of admitted claims for the key.
    pub fills: u64,
    /// Number of those claims referenced by an admitted revert.
    pub reverted: u64,
    /// Mean unit price, rounded to 2 decimals.
    pub avg_price: f64,
    /// Sum of claim prices, rounded to 2 decimals.
    pub total_price: f64,
}

/// One chain entry in a [`ChainRecommendation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPrice {
    pub name: String,
    pub avg_price: f64,
}

/// The cheapest chains for a drug, cheapest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecommendation {
    pub ndc: String,
    pub chain: Vec<ChainPrice>,
}

/// The most frequently prescribed quantities for a drug, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityProfile {
    pub ndc: String,
    pub most_prescribed_quantity: Vec<i64>,
}
