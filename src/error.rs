//! Error types for the rating service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. The scoring formulas themselves never fail; these errors
//! come from the review write cycle, storage and configuration.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific review scoring scenarios
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("Invalid review: {reason}")]
    InvalidReview { reason: String },

    #[error("Review not found: {review_id}")]
    ReviewNotFound { review_id: String },

    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
