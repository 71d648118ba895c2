//! Main application configuration
//!
//! This module defines the primary configuration structures for the game-rating
//! service, including environment variable and TOML file loading and validation.

use crate::config::scoring::ScoringConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub scoring: ScoringConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "game-rating".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse TOML without consulting the environment
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Scoring settings
        let scoring = &mut self.scoring;
        if let Some(weight) = parse_env("VERIFIED_WEIGHT")? {
            scoring.weights.verified = weight;
        }
        if let Some(weight) = parse_env("UNVERIFIED_WEIGHT")? {
            scoring.weights.unverified = weight;
        }
        if let Some(count) = parse_env("PRIOR_COUNT")? {
            scoring.prior_count = count;
        }
        if let Some(mean) = parse_env("PRIOR_MEAN")? {
            scoring.prior_mean = mean;
        }
        if let Some(days) = parse_env("RECENT_WINDOW_DAYS")? {
            scoring.recent_window_days = days;
        }
        if let Some(ratio) = parse_env("SPIKE_RATIO_THRESHOLD")? {
            scoring.spike_ratio_threshold = ratio;
        }
        if let Some(floor) = parse_env("RECENT_WEIGHT_FLOOR")? {
            scoring.recent_weight_floor = floor;
        }
        if let Some(strategy) = parse_env("AVERAGE_STRATEGY")? {
            scoring.average_strategy = strategy;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.scoring.validate()
}
