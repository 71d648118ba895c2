//! Utility functions for the rating service

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Generate a new unique review ID
pub fn generate_review_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new unique game ID
pub fn generate_game_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Age of `created_at` relative to `now`, clamped at zero for timestamps in the future
pub fn age_at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let age = now.signed_duration_since(created_at);
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}

/// Round a score for display, e.g. `round_to(3.0909, 2) == 3.09`
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
