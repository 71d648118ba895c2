//! Review and summary storage interfaces and implementations
//!
//! The scoring formulas need every review of a game, so review storage never
//! filters or samples. Summary storage always overwrites a game's summary as a
//! whole.

use crate::error::ScoringError;
use crate::rating::calculator::RatingSummary;
use crate::types::{GameId, Review, ReviewId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Trait for review storage operations
pub trait ReviewStorage: Send + Sync {
    /// Get a single review
    fn get_review(&self, review_id: &ReviewId) -> crate::error::Result<Option<Review>>;

    /// Get every review of a game, oldest first
    fn get_reviews_for_game(&self, game_id: &GameId) -> crate::error::Result<Vec<Review>>;

    /// Insert or replace a review
    fn store_review(&self, review: Review) -> crate::error::Result<()>;

    /// Remove a review, returning it if it existed
    fn remove_review(&self, review_id: &ReviewId) -> crate::error::Result<Option<Review>>;

    /// Number of reviews of a game
    fn review_count(&self, game_id: &GameId) -> crate::error::Result<usize>;
}

/// Trait for persisting per-game summaries
#[cfg_attr(test, mockall::automock)]
pub trait SummaryStore: Send + Sync {
    fn get_summary(&self, game_id: &GameId) -> crate::error::Result<Option<RatingSummary>>;

    /// Replace the stored summary of a game
    fn store_summary(&self, game_id: GameId, summary: RatingSummary) -> crate::error::Result<()>;

    /// Drop the summary of a game, returning whether one existed
    fn remove_summary(&self, game_id: &GameId) -> crate::error::Result<bool>;
}

fn read_lock<T>(lock: &RwLock<T>) -> crate::error::Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| {
        ScoringError::InternalError {
            message: "Failed to acquire storage read lock".to_string(),
        }
        .into()
    })
}

fn write_lock<T>(lock: &RwLock<T>) -> crate::error::Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| {
        ScoringError::InternalError {
            message: "Failed to acquire storage write lock".to_string(),
        }
        .into()
    })
}

/// In-memory review storage implementation
#[derive(Debug, Default)]
pub struct InMemoryReviewStorage {
    reviews: RwLock<HashMap<ReviewId, Review>>,
}

impl InMemoryReviewStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReviewStorage for InMemoryReviewStorage {
    fn get_review(&self, review_id: &ReviewId) -> crate::error::Result<Option<Review>> {
        let reviews = read_lock(&self.reviews)?;
        Ok(reviews.get(review_id).cloned())
    }

    fn get_reviews_for_game(&self, game_id: &GameId) -> crate::error::Result<Vec<Review>> {
        let reviews = read_lock(&self.reviews)?;

        let mut matching: Vec<Review> = reviews
            .values()
            .filter(|review| review.game_id == *game_id)
            .cloned()
            .collect();

        // Stable order keeps floating point sums reproducible between calls
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(matching)
    }

    fn store_review(&self, review: Review) -> crate::error::Result<()> {
        let mut reviews = write_lock(&self.reviews)?;
        reviews.insert(review.id, review);
        Ok(())
    }

    fn remove_review(&self, review_id: &ReviewId) -> crate::error::Result<Option<Review>> {
        let mut reviews = write_lock(&self.reviews)?;
        Ok(reviews.remove(review_id))
    }

    fn review_count(&self, game_id: &GameId) -> crate::error::Result<usize> {
        let reviews = read_lock(&self.reviews)?;
        Ok(reviews.values().filter(|r| r.game_id == *game_id).count())
    }
}

/// In-memory summary store implementation
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    summaries: RwLock<HashMap<GameId, RatingSummary>>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SummaryStore for InMemorySummaryStore {
    fn get_summary(&self, game_id: &GameId) -> crate::error::Result<Option<RatingSummary>> {
        let summaries = read_lock(&self.summaries)?;
        Ok(summaries.get(game_id).cloned())
    }

    fn store_summary(&self, game_id: GameId, summary: RatingSummary) -> crate::error::Result<()> {
        let mut summaries = write_lock(&self.summaries)?;
        summaries.insert(game_id, summary);
        Ok(())
    }

    fn remove_summary(&self, game_id: &GameId) -> crate::error::Result<bool> {
        let mut summaries = write_lock(&self.summaries)?;
        Ok(summaries.remove(game_id).is_some())
    }
}
