//! Per-review weights keyed on verification tier

use crate::error::ScoringError;
use crate::types::{Review, Verification};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weight table applied to each review before averaging
///
/// Every verified tier falls back to `verified` unless it has an entry in
/// `tiers`. Verification only ever changes a review's weight; it never
/// excludes a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationWeights {
    /// Weight of a review without proof of ownership
    pub unverified: f64,
    /// Weight of a review with any proof of ownership
    pub verified: f64,
    /// Optional per-tier overrides
    pub tiers: HashMap<Verification, f64>,
}

impl Default for VerificationWeights {
    fn default() -> Self {
        Self {
            unverified: 1.0,
            verified: 1.5,
            tiers: HashMap::new(),
        }
    }
}

impl VerificationWeights {
    /// Weight for a verification tier
    pub fn weight(&self, verification: Verification) -> f64 {
        if let Some(weight) = self.tiers.get(&verification) {
            return *weight;
        }
        if verification.is_verified() {
            self.verified
        } else {
            self.unverified
        }
    }

    /// Weight for a single review
    pub fn for_review(&self, review: &Review) -> f64 {
        self.weight(review.verification)
    }

    /// Override the weight of one tier
    pub fn with_tier(mut self, verification: Verification, weight: f64) -> Self {
        self.tiers.insert(verification, weight);
        self
    }

    /// All weights must be finite and strictly positive
    pub fn validate(&self) -> crate::error::Result<()> {
        let base = [("unverified", self.unverified), ("verified", self.verified)];
        for (name, weight) in base {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(ScoringError::ConfigurationError {
                    message: format!("{} weight must be positive, got {}", name, weight),
                }
                .into());
            }
        }

        for (tier, weight) in &self.tiers {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(ScoringError::ConfigurationError {
                    message: format!("{} tier weight must be positive, got {}", tier, weight),
                }
                .into());
            }
        }

        Ok(())
    }
}
