//! Game Rating - review score aggregation for a game rating platform
//!
//! This crate turns a game's user reviews into its displayed score: verified
//! reviews weigh more, a Bayesian prior keeps new games from swinging on a
//! handful of reviews, and a time-weighted average damps review bombing.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, ScoringError};
pub use types::*;

// Re-export key components
pub use rating::{
    classify_label, RatingAggregator, RatingLabel, RatingSummary, ReviewLedger,
    ReviewScoreCalculator, ScoreCalculator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
