//! Data layer for the pharmacy claims pipeline.
//!
//! Responsible for discovering and reading pharmacy, claim and revert files,
//! aggregating fill metrics, running the per-drug analyses and writing the
//! JSON reports.

pub mod aggregator;
pub mod analysis;
pub mod analyzer;
pub mod reader;
pub mod writer;

pub use claims_core as core;
