//! Command line entry point for the game-rating aggregator
//!
//! Reads a game's reviews as JSON, runs them through the review ledger and
//! prints the resulting rating summary.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use game_rating::config::AppConfig;
use game_rating::metrics::MetricsCollector;
use game_rating::rating::{AverageStrategy, ReviewLedger, ReviewScoreCalculator, ScoreCalculator};
use game_rating::types::{GameId, Review, Verification};
use game_rating::utils::{current_timestamp, generate_game_id};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Game Rating - aggregate user reviews into a game's score
#[derive(Parser)]
#[command(
    name = "game-rating",
    version,
    about = "Aggregate a game's reviews into weighted, Bayesian and review-bomb resistant scores",
    long_about = "Reads a JSON array of reviews ({rating, verification | is_verified, created_at}) \
                 from a file or stdin and prints the game's rating summary as JSON. A bare \
                 is_verified flag counts as the generic `verified` tier, never a named store. \
                 Verified reviews weigh more, a Bayesian prior steadies small samples, and a \
                 burst of recent reviews is damped by the time-weighted average."
)]
struct Args {
    /// Reviews file (JSON array); stdin when omitted
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Reference time for the recent-review window
    #[arg(long, value_name = "RFC3339", help = "Evaluate as of this time instead of now")]
    now: Option<DateTime<Utc>>,

    /// Canonical average override
    #[arg(
        short,
        long,
        value_name = "STRATEGY",
        help = "Canonical average (arithmetic, weighted, bayesian, time_weighted)"
    )]
    strategy: Option<AverageStrategy>,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without reading reviews")]
    dry_run: bool,

    /// Print Prometheus metrics after the summary
    #[arg(long, help = "Print collected metrics in Prometheus text format to stderr")]
    metrics: bool,
}

/// Review as accepted on the command line
#[derive(Debug, Deserialize)]
struct ReviewInput {
    rating: f64,
    #[serde(default)]
    verification: Option<Verification>,
    #[serde(default)]
    is_verified: bool,
    created_at: DateTime<Utc>,
    #[serde(default)]
    author_id: Option<String>,
}

impl ReviewInput {
    fn into_review(self, game_id: GameId, index: usize) -> Review {
        let verification = match (self.verification, self.is_verified) {
            (Some(verification), _) => verification,
            (None, true) => Verification::Verified,
            (None, false) => Verification::Unverified,
        };
        let author_id = self
            .author_id
            .unwrap_or_else(|| format!("reviewer-{}", index + 1));

        Review::new(game_id, author_id, self.rating, verification, self.created_at)
    }
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(strategy) = args.strategy {
        config.scoring.average_strategy = strategy;
    }

    game_rating::config::validate_config(&config)?;
    Ok(config)
}

fn read_reviews(input: Option<&PathBuf>) -> Result<Vec<ReviewInput>> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reviews from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read reviews from stdin")?;
            buffer
        }
    };

    serde_json::from_str(&raw).context("Reviews must be a JSON array")
}

fn run(args: &Args, config: AppConfig) -> Result<()> {
    let now = args.now.unwrap_or_else(current_timestamp);
    let calculator = ReviewScoreCalculator::new(config.scoring.clone())?;
    let metrics = Arc::new(MetricsCollector::new()?);
    let ledger = ReviewLedger::in_memory(calculator.clone()).with_metrics(metrics.clone());

    let inputs = read_reviews(args.input.as_ref())?;
    info!("Loaded {} reviews, evaluating as of {}", inputs.len(), now);

    let game_id = generate_game_id();
    let mut rejected = 0usize;
    for (index, input) in inputs.into_iter().enumerate() {
        let review = input.into_review(game_id, index);
        if let Err(e) = ledger.submit_review(review, now) {
            warn!("Skipping review #{}: {}", index + 1, e);
            rejected += 1;
        }
    }

    let summary = match ledger.summary(&game_id)? {
        Some(summary) => summary,
        None => {
            warn!("No valid reviews; reporting empty-input defaults");
            calculator.summarize(&[], now)
        }
    };

    info!(
        "{} reviews accepted, {} rejected: {:.2} {} ({})",
        summary.total_reviews, rejected, summary.average_rating, summary.label, summary.strategy
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if args.metrics {
        eprintln!("{}", metrics.render()?);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        info!(
            "   Strategy: {}, prior {} @ {}, window {}d, spike ratio > {}",
            config.scoring.average_strategy,
            config.scoring.prior_count,
            config.scoring.prior_mean,
            config.scoring.recent_window_days,
            config.scoring.spike_ratio_threshold
        );
        return Ok(());
    }

    if let Err(e) = run(&args, config) {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
