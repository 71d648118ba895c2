//! Common types used throughout the rating service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for games
pub type GameId = Uuid;

/// Unique identifier for reviews
pub type ReviewId = Uuid;

/// Identifier of the account that wrote a review
pub type UserId = String;

/// Lowest score a review may carry
pub const MIN_RATING: f64 = 0.5;

/// Highest score a review may carry
pub const MAX_RATING: f64 = 5.0;

/// Scores move in half-star steps
pub const RATING_STEP: f64 = 0.5;

/// Proof of ownership or play attached to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    #[default]
    Unverified,
    /// Verified without a named source; weighed with the base verified weight
    Verified,
    Steam,
    PlayStation,
    Xbox,
    Screenshot,
}

impl Verification {
    /// Every tier except `Unverified` counts as a verified review
    pub fn is_verified(&self) -> bool {
        !matches!(self, Verification::Unverified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verification::Unverified => "unverified",
            Verification::Verified => "verified",
            Verification::Steam => "steam",
            Verification::PlayStation => "play_station",
            Verification::Xbox => "xbox",
            Verification::Screenshot => "screenshot",
        }
    }
}

impl std::fmt::Display for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Verification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unverified" | "none" => Ok(Verification::Unverified),
            "verified" => Ok(Verification::Verified),
            "steam" => Ok(Verification::Steam),
            "play_station" | "playstation" | "psn" => Ok(Verification::PlayStation),
            "xbox" => Ok(Verification::Xbox),
            "screenshot" => Ok(Verification::Screenshot),
            other => Err(format!("Unknown verification type: {}", other)),
        }
    }
}

/// A single user review of a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub game_id: GameId,
    pub author_id: UserId,
    /// Half-star score in [0.5, 5.0]
    pub rating: f64,
    #[serde(default)]
    pub verification: Verification,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Create a new review with a freshly generated id
    pub fn new(
        game_id: GameId,
        author_id: impl Into<UserId>,
        rating: f64,
        verification: Verification,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: crate::utils::generate_review_id(),
            game_id,
            author_id: author_id.into(),
            rating,
            verification,
            created_at,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verification.is_verified()
    }
}

/// Check that a score is finite, in range and on a half-star step
pub fn is_valid_rating(rating: f64) -> bool {
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return false;
    }
    let steps = rating / RATING_STEP;
    (steps - steps.round()).abs() < 1e-9
}
