//! Test fixtures for building review sets

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use game_rating::types::{GameId, Review, Verification};

/// Fixed reference time so recency checks are deterministic
pub fn reference_now() -> DateTime<Utc> {
    "2024-09-01T12:00:00Z".parse().expect("valid timestamp")
}

/// Builder for a batch of reviews on one game
pub struct ReviewSetBuilder {
    game_id: GameId,
    now: DateTime<Utc>,
    reviews: Vec<Review>,
}

impl ReviewSetBuilder {
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            now: reference_now(),
            reviews: Vec::new(),
        }
    }

    /// Add `count` reviews of the same score and age
    pub fn add(
        mut self,
        count: usize,
        rating: f64,
        verification: Verification,
        age: Duration,
    ) -> Self {
        for _ in 0..count {
            let author = format!("user{}", self.reviews.len() + 1);
            self.reviews.push(Review::new(
                self.game_id,
                author,
                rating,
                verification,
                self.now - age,
            ));
        }
        self
    }

    pub fn old(self, count: usize, rating: f64) -> Self {
        self.add(count, rating, Verification::Unverified, Duration::days(90))
    }

    pub fn fresh(self, count: usize, rating: f64) -> Self {
        self.add(count, rating, Verification::Unverified, Duration::zero())
    }

    pub fn build(self) -> Vec<Review> {
        self.reviews
    }
}

/// Three long-standing 5-star reviews followed by seven 1-star reviews posted just now
pub fn review_bomb(game_id: GameId) -> Vec<Review> {
    ReviewSetBuilder::new(game_id).old(3, 5.0).fresh(7, 1.0).build()
}
