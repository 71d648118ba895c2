//! Score aggregation over a game's full review set
//!
//! Every function here is pure: it reads the reviews it is given, performs no
//! I/O and keeps no state between calls, so two calls on the same input return
//! bit-identical results. Callers always pass the complete current review set
//! for one game; there is no incremental update path.
//!
//! Empty input conventions differ on purpose: the plain, weighted and
//! time-weighted averages return `0.0`, while the Bayesian average returns its
//! prior mean. Callers that need to tell "no reviews" apart should check the
//! review count first.

use crate::config::ScoringConfig;
use crate::types::{Review, MAX_RATING, MIN_RATING, RATING_STEP};
use crate::utils::age_at;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of half-star buckets between `MIN_RATING` and `MAX_RATING`
pub const DISTRIBUTION_BUCKETS: usize = 10;

/// Outcome of the recent-review spike check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeAnalysis {
    pub total_reviews: usize,
    /// Reviews no older than the recent window
    pub recent_reviews: usize,
    /// `recent_reviews / total_reviews`, 0 when there are no reviews
    pub recent_ratio: f64,
    pub is_spike: bool,
}

/// Review counts per half-star score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatingDistribution {
    /// `counts[0]` holds 0.5-star reviews, `counts[9]` holds 5-star reviews
    pub counts: [u64; DISTRIBUTION_BUCKETS],
}

impl RatingDistribution {
    fn bucket(rating: f64) -> usize {
        let steps = (rating.clamp(MIN_RATING, MAX_RATING) / RATING_STEP).round() as usize;
        steps.saturating_sub(1).min(DISTRIBUTION_BUCKETS - 1)
    }

    pub fn record(&mut self, rating: f64) {
        self.counts[Self::bucket(rating)] += 1;
    }

    /// Number of reviews with exactly this score
    pub fn count_for(&self, rating: f64) -> u64 {
        self.counts[Self::bucket(rating)]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(score, count)` pairs from 0.5 up to 5.0
    pub fn iter(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, count)| ((i + 1) as f64 * RATING_STEP, *count))
    }
}

/// Aggregation formulas bound to one scoring configuration
#[derive(Debug, Clone, Default)]
pub struct RatingAggregator {
    config: ScoringConfig,
}

impl RatingAggregator {
    /// Create an aggregator after validating its configuration
    pub fn new(config: ScoringConfig) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Base weight of a review from its verification tier
    pub fn weight(&self, review: &Review) -> f64 {
        self.config.weights.for_review(review)
    }

    /// Unweighted mean of all scores; 0 for no reviews
    pub fn arithmetic_mean(&self, reviews: &[Review]) -> f64 {
        if reviews.is_empty() {
            return 0.0;
        }
        reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64
    }

    /// `Σ(rating × W) / Σ(W)`; 0 for no reviews
    pub fn weighted_average(&self, reviews: &[Review]) -> f64 {
        let (weighted_sum, total_weight) = self.weighted_sums(reviews, |r| self.weight(r));
        if total_weight == 0.0 {
            return 0.0;
        }
        weighted_sum / total_weight
    }

    /// `(C × m + Σ(rating × W)) / (C + Σ(W))`; the prior mean for no reviews
    pub fn bayesian_average(&self, reviews: &[Review]) -> f64 {
        let (weighted_sum, total_weight) = self.weighted_sums(reviews, |r| self.weight(r));
        let prior_count = self.config.prior_count;
        let prior_mean = self.config.prior_mean;

        (prior_count * prior_mean + weighted_sum) / (prior_count + total_weight)
    }

    /// Count how many reviews landed inside the recent window
    pub fn detect_spike(&self, reviews: &[Review], now: DateTime<Utc>) -> SpikeAnalysis {
        let window = self.config.recent_window();
        let total_reviews = reviews.len();
        let recent_reviews = reviews
            .iter()
            .filter(|r| age_at(r.created_at, now) <= window)
            .count();

        let recent_ratio = if total_reviews == 0 {
            0.0
        } else {
            recent_reviews as f64 / total_reviews as f64
        };

        SpikeAnalysis {
            total_reviews,
            recent_reviews,
            recent_ratio,
            is_spike: recent_ratio > self.config.spike_ratio_threshold,
        }
    }

    /// Multiplier on a review's weight: below 1 only for recent reviews during a spike
    pub fn recency_factor(&self, review: &Review, now: DateTime<Utc>, spike: bool) -> f64 {
        if !spike {
            return 1.0;
        }

        let window = self.config.recent_window();
        let age = age_at(review.created_at, now);
        if age > window {
            return 1.0;
        }

        let floor = self.config.recent_weight_floor;
        let progress = (age.num_milliseconds() as f64 / window.num_milliseconds() as f64).min(1.0);
        floor + (1.0 - floor) * progress
    }

    /// Weighted average that damps very recent reviews when they dominate the review set
    pub fn time_weighted_average(&self, reviews: &[Review], now: DateTime<Utc>) -> f64 {
        let spike = self.detect_spike(reviews, now).is_spike;
        let (weighted_sum, total_weight) = self.weighted_sums(reviews, |r| {
            self.weight(r) * self.recency_factor(r, now, spike)
        });

        if total_weight == 0.0 {
            return 0.0;
        }
        weighted_sum / total_weight
    }

    /// Histogram of scores in half-star buckets
    pub fn rating_distribution(&self, reviews: &[Review]) -> RatingDistribution {
        let mut distribution = RatingDistribution::default();
        for review in reviews {
            distribution.record(review.rating);
        }
        distribution
    }

    fn weighted_sums<F>(&self, reviews: &[Review], weight_of: F) -> (f64, f64)
    where
        F: Fn(&Review) -> f64,
    {
        reviews
            .iter()
            .fold((0.0, 0.0), |(sum, total), review| {
                let weight = weight_of(review);
                (sum + review.rating * weight, total + weight)
            })
    }
}

/// Weighted average with the default weights
pub fn weighted_average(reviews: &[Review]) -> f64 {
    RatingAggregator::default().weighted_average(reviews)
}

/// Bayesian average with the default prior (10 reviews at 3.0)
pub fn bayesian_average(reviews: &[Review]) -> f64 {
    RatingAggregator::default().bayesian_average(reviews)
}

/// Spike-damped average with the default seven-day window
pub fn time_weighted_average(reviews: &[Review], now: DateTime<Utc>) -> f64 {
    RatingAggregator::default().time_weighted_average(reviews, now)
}
