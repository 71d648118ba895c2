//! Review scoring configuration

use crate::error::ScoringError;
use crate::rating::calculator::AverageStrategy;
use crate::rating::weight::VerificationWeights;
use serde::{Deserialize, Serialize};

/// Tunable constants for the aggregation formulas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Per-review weights by verification tier
    pub weights: VerificationWeights,
    /// Bayesian prior confidence, in review-weight units
    pub prior_count: f64,
    /// Bayesian prior mean
    pub prior_mean: f64,
    /// Reviews at most this old count as recent for spike detection
    pub recent_window_days: u32,
    /// A spike is declared when the recent share of reviews exceeds this
    pub spike_ratio_threshold: f64,
    /// Weight multiplier for a brand new review during a spike
    pub recent_weight_floor: f64,
    /// Which average becomes the game's canonical score
    pub average_strategy: AverageStrategy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: VerificationWeights::default(),
            prior_count: 10.0,
            prior_mean: 3.0,
            recent_window_days: 7,
            spike_ratio_threshold: 0.5,
            recent_weight_floor: 0.5,
            average_strategy: AverageStrategy::Arithmetic,
        }
    }
}

impl ScoringConfig {
    /// Recent window as a chrono duration
    pub fn recent_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.recent_window_days))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        self.weights.validate()?;

        if !self.prior_count.is_finite() || self.prior_count <= 0.0 {
            return Err(ScoringError::ConfigurationError {
                message: "Prior count must be positive".to_string(),
            }
            .into());
        }

        if !(crate::types::MIN_RATING..=crate::types::MAX_RATING).contains(&self.prior_mean) {
            return Err(ScoringError::ConfigurationError {
                message: format!(
                    "Prior mean must be within [{}, {}]",
                    crate::types::MIN_RATING,
                    crate::types::MAX_RATING
                ),
            }
            .into());
        }

        if self.recent_window_days == 0 {
            return Err(ScoringError::ConfigurationError {
                message: "Recent window must be at least one day".to_string(),
            }
            .into());
        }

        if !(0.0..1.0).contains(&self.spike_ratio_threshold) {
            return Err(ScoringError::ConfigurationError {
                message: "Spike ratio threshold must be within [0, 1)".to_string(),
            }
            .into());
        }

        if !(self.recent_weight_floor > 0.0 && self.recent_weight_floor <= 1.0) {
            return Err(ScoringError::ConfigurationError {
                message: "Recent weight floor must be within (0, 1]".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
