//! Kindred Match - multi-algorithm profile matching service
//!
//! Scores pairs of person profiles with several independent similarity
//! algorithms, fuses them into a calibrated confidence, predicts the likely
//! relationship and ranks candidates for a target profile.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{MatchEngine, MatchError, MatchParams};
pub use models::{MatchContext, MatchOutcome, Profile};
