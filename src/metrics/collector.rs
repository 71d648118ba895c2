//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for review summary recomputation
//! using Prometheus metrics.

use crate::rating::calculator::RatingSummary;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What caused a summary to be recomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeTrigger {
    Created,
    Updated,
    Deleted,
    Manual,
}

impl RecomputeTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecomputeTrigger::Created => "created",
            RecomputeTrigger::Updated => "updated",
            RecomputeTrigger::Deleted => "deleted",
            RecomputeTrigger::Manual => "manual",
        }
    }
}

/// Main metrics collector for the rating service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    scoring_metrics: ScoringMetrics,
}

/// Summary recomputation metrics
#[derive(Clone)]
pub struct ScoringMetrics {
    /// Total summaries computed, by trigger
    pub summaries_computed_total: IntCounterVec,

    /// Review-bomb spikes detected during recomputation
    pub review_spikes_total: IntCounter,

    /// Rejected review submissions
    pub rejected_reviews_total: IntCounter,

    /// Size of the review set each recompute scanned
    pub reviews_per_recompute: Histogram,

    /// Time spent in a full read-recompute-write cycle
    pub recompute_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let scoring_metrics = ScoringMetrics::new(&registry)?;

        Ok(Self {
            registry,
            scoring_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get scoring metrics
    pub fn scoring(&self) -> &ScoringMetrics {
        &self.scoring_metrics
    }

    /// Record a completed summary recomputation
    pub fn record_recompute(
        &self,
        trigger: RecomputeTrigger,
        summary: &RatingSummary,
        duration: Duration,
    ) {
        self.scoring_metrics
            .summaries_computed_total
            .with_label_values(&[trigger.as_str()])
            .inc();

        if summary.spike.is_spike {
            self.scoring_metrics.review_spikes_total.inc();
        }

        self.scoring_metrics
            .reviews_per_recompute
            .observe(summary.total_reviews as f64);

        self.scoring_metrics
            .recompute_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a review rejected by validation
    pub fn record_rejected_review(&self) {
        self.scoring_metrics.rejected_reviews_total.inc();
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ScoringMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let summaries_computed_total = IntCounterVec::new(
            Opts::new(
                "game_rating_summaries_computed_total",
                "Total rating summaries computed",
            ),
            &["trigger"],
        )?;
        registry.register(Box::new(summaries_computed_total.clone()))?;

        let review_spikes_total = IntCounter::new(
            "game_rating_review_spikes_total",
            "Recomputations that detected a spike of recent reviews",
        )?;
        registry.register(Box::new(review_spikes_total.clone()))?;

        let rejected_reviews_total = IntCounter::new(
            "game_rating_rejected_reviews_total",
            "Review submissions rejected by validation",
        )?;
        registry.register(Box::new(rejected_reviews_total.clone()))?;

        let reviews_per_recompute = Histogram::with_opts(
            HistogramOpts::new(
                "game_rating_reviews_per_recompute",
                "Number of reviews scanned per summary recomputation",
            )
            .buckets(vec![
                1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0,
            ]),
        )?;
        registry.register(Box::new(reviews_per_recompute.clone()))?;

        let recompute_duration = Histogram::with_opts(
            HistogramOpts::new(
                "game_rating_recompute_duration_seconds",
                "Time spent recomputing a game's rating summary",
            )
            .buckets(vec![
                0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
            ]),
        )?;
        registry.register(Box::new(recompute_duration.clone()))?;

        Ok(Self {
            summaries_computed_total,
            review_spikes_total,
            rejected_reviews_total,
            reviews_per_recompute,
            recompute_duration,
        })
    }
}
