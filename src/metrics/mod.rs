//! Metrics for the rating service
//!
//! Prometheus counters and histograms around summary recomputation. The
//! scoring formulas themselves record nothing; the ledger records on their behalf.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, RecomputeTrigger, ScoringMetrics};
