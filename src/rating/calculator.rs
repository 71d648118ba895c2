//! Rating summary calculator trait and implementation
//!
//! A summary is always derived fresh from a game's complete review set. The
//! calculator computes every average; the configured strategy decides which one
//! becomes the canonical `average_rating` that the label is derived from.

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::rating::aggregator::{RatingAggregator, RatingDistribution, SpikeAnalysis};
use crate::rating::label::{classify_label, RatingLabel};
use crate::types::Review;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which average is stored as a game's canonical score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageStrategy {
    /// Plain mean of all scores
    #[default]
    Arithmetic,
    Weighted,
    Bayesian,
    TimeWeighted,
}

impl std::fmt::Display for AverageStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AverageStrategy::Arithmetic => write!(f, "arithmetic"),
            AverageStrategy::Weighted => write!(f, "weighted"),
            AverageStrategy::Bayesian => write!(f, "bayesian"),
            AverageStrategy::TimeWeighted => write!(f, "time_weighted"),
        }
    }
}

impl std::str::FromStr for AverageStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "arithmetic" | "mean" => Ok(AverageStrategy::Arithmetic),
            "weighted" => Ok(AverageStrategy::Weighted),
            "bayesian" => Ok(AverageStrategy::Bayesian),
            "time_weighted" => Ok(AverageStrategy::TimeWeighted),
            other => Err(format!("Unknown average strategy: {}", other)),
        }
    }
}

/// Derived score fields for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Label of `average_rating`
    pub label: RatingLabel,
    /// Canonical score picked by `strategy`
    pub average_rating: f64,
    pub arithmetic_average: f64,
    pub weighted_average: f64,
    pub bayesian_average: f64,
    pub time_weighted_average: f64,
    pub total_reviews: usize,
    pub verified_reviews: usize,
    pub spike: SpikeAnalysis,
    pub distribution: RatingDistribution,
    pub strategy: AverageStrategy,
    /// The `now` the summary was computed against
    pub computed_at: DateTime<Utc>,
}

impl RatingSummary {
    pub fn has_reviews(&self) -> bool {
        self.total_reviews > 0
    }

    /// Read one of the computed averages
    pub fn average_for(&self, strategy: AverageStrategy) -> f64 {
        match strategy {
            AverageStrategy::Arithmetic => self.arithmetic_average,
            AverageStrategy::Weighted => self.weighted_average,
            AverageStrategy::Bayesian => self.bayesian_average,
            AverageStrategy::TimeWeighted => self.time_weighted_average,
        }
    }
}

/// Trait for turning a game's reviews into a summary
pub trait ScoreCalculator: Send + Sync {
    /// Summarize the complete review set of one game as of `now`
    fn summarize(&self, reviews: &[Review], now: DateTime<Utc>) -> RatingSummary;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;

    /// Update configuration from JSON; a ledger reaches this through
    /// `ReviewLedger::reconfigure`
    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()>;
}

/// Default calculator backed by [`RatingAggregator`]
#[derive(Debug, Clone, Default)]
pub struct ReviewScoreCalculator {
    aggregator: RatingAggregator,
}

impl ReviewScoreCalculator {
    pub fn new(config: ScoringConfig) -> crate::error::Result<Self> {
        Ok(Self {
            aggregator: RatingAggregator::new(config)?,
        })
    }

    pub fn aggregator(&self) -> &RatingAggregator {
        &self.aggregator
    }

    pub fn strategy(&self) -> AverageStrategy {
        self.aggregator.config().average_strategy
    }
}

impl ScoreCalculator for ReviewScoreCalculator {
    fn summarize(&self, reviews: &[Review], now: DateTime<Utc>) -> RatingSummary {
        let aggregator = &self.aggregator;
        let strategy = self.strategy();

        let mut summary = RatingSummary {
            label: RatingLabel::VeryNegative,
            average_rating: 0.0,
            arithmetic_average: aggregator.arithmetic_mean(reviews),
            weighted_average: aggregator.weighted_average(reviews),
            bayesian_average: aggregator.bayesian_average(reviews),
            time_weighted_average: aggregator.time_weighted_average(reviews, now),
            total_reviews: reviews.len(),
            verified_reviews: reviews.iter().filter(|r| r.is_verified()).count(),
            spike: aggregator.detect_spike(reviews, now),
            distribution: aggregator.rating_distribution(reviews),
            strategy,
            computed_at: now,
        };

        summary.average_rating = summary.average_for(strategy);
        summary.label = classify_label(summary.average_rating);
        summary
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(self.aggregator.config()).unwrap_or(serde_json::Value::Null)
    }

    fn update_config(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        let new_config: ScoringConfig =
            serde_json::from_value(config).map_err(|e| ScoringError::ConfigurationError {
                message: format!("Invalid scoring configuration: {}", e),
            })?;

        self.aggregator = RatingAggregator::new(new_config)?;
        Ok(())
    }
}
