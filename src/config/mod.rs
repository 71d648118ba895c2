//! Configuration management for the game-rating service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the scoring formulas.

pub mod app;
pub mod scoring;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use scoring::ScoringConfig;
