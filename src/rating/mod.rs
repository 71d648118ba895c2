//! Review score aggregation
//!
//! This module provides the label classifier, the weighted, Bayesian and
//! time-weighted averages, the summary calculator seam, storage interfaces and
//! the per-game review write cycle.

pub mod aggregator;
pub mod calculator;
pub mod label;
pub mod ledger;
pub mod storage;
pub mod weight;

// Re-export commonly used types
pub use aggregator::{
    bayesian_average, time_weighted_average, weighted_average, RatingAggregator,
    RatingDistribution, SpikeAnalysis,
};
pub use calculator::{AverageStrategy, RatingSummary, ReviewScoreCalculator, ScoreCalculator};
pub use label::{classify_label, RatingLabel};
pub use ledger::ReviewLedger;
pub use storage::{InMemoryReviewStorage, InMemorySummaryStore, ReviewStorage, SummaryStore};
pub use weight::VerificationWeights;
