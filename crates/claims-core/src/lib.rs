//! Shared types for the pharmacy claims pipeline.
//!
//! Record and report models, the error taxonomy, record validation, rounding
//! helpers and the command-line settings.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
