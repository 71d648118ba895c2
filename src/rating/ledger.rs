//! Review write cycle with per-game summary recomputation
//!
//! Every mutation reloads the complete review set of the affected game,
//! recomputes its summary from scratch and overwrites the stored summary. The
//! whole read-recompute-write cycle runs under a per-game mutex: two writers on
//! the same game are serialized so neither can store a summary built from a
//! stale review set, while different games never wait on each other.
//!
//! A mutation whose recompute fails is undone before the game lock is
//! released, so the review store never runs ahead of the stored summary.

use crate::error::ScoringError;
use crate::metrics::{MetricsCollector, RecomputeTrigger};
use crate::rating::calculator::{RatingSummary, ReviewScoreCalculator, ScoreCalculator};
use crate::rating::storage::{
    InMemoryReviewStorage, InMemorySummaryStore, ReviewStorage, SummaryStore,
};
use crate::types::{is_valid_rating, GameId, Review, ReviewId, Verification};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Owns the review write path for all games
pub struct ReviewLedger {
    reviews: Arc<dyn ReviewStorage>,
    summaries: Arc<dyn SummaryStore>,
    calculator: Box<dyn ScoreCalculator>,
    /// Locks of games with a write in flight; idle games have no entry
    game_locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ReviewLedger {
    pub fn new(
        reviews: Arc<dyn ReviewStorage>,
        summaries: Arc<dyn SummaryStore>,
        calculator: Box<dyn ScoreCalculator>,
    ) -> Self {
        Self {
            reviews,
            summaries,
            calculator,
            game_locks: Mutex::new(HashMap::new()),
            metrics: None,
        }
    }

    /// Ledger backed by in-memory stores
    pub fn in_memory(calculator: ReviewScoreCalculator) -> Self {
        Self::new(
            Arc::new(InMemoryReviewStorage::new()),
            Arc::new(InMemorySummaryStore::new()),
            Box::new(calculator),
        )
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Current scoring configuration as JSON
    pub fn scoring_config(&self) -> serde_json::Value {
        self.calculator.config()
    }

    /// Replace the scoring configuration.
    ///
    /// Stored summaries keep their values until their game is next
    /// recomputed. An invalid configuration leaves the current one in place.
    pub fn reconfigure(&mut self, config: serde_json::Value) -> crate::error::Result<()> {
        self.calculator.update_config(config)?;
        info!("Scoring configuration replaced");
        Ok(())
    }

    /// Add a new review and return the game's refreshed summary
    pub fn submit_review(
        &self,
        review: Review,
        now: DateTime<Utc>,
    ) -> crate::error::Result<RatingSummary> {
        self.validate_review(&review)?;

        let game_id = review.game_id;
        let review_id = review.id;
        self.with_game_lock(game_id, || {
            if self.reviews.get_review(&review_id)?.is_some() {
                return Err(ScoringError::InvalidReview {
                    reason: format!("Review {} already exists", review_id),
                }
                .into());
            }

            debug!(
                "Storing review {} for game {} (rating {}, {})",
                review_id, game_id, review.rating, review.verification
            );
            self.reviews.store_review(review)?;

            self.recompute_or_undo(game_id, RecomputeTrigger::Created, now, || {
                self.reviews.remove_review(&review_id).map(|_| ())
            })?
            .ok_or_else(|| missing_summary(game_id))
        })
    }

    /// Change the score and verification of an existing review
    pub fn update_review(
        &self,
        review_id: ReviewId,
        rating: f64,
        verification: Verification,
        now: DateTime<Utc>,
    ) -> crate::error::Result<RatingSummary> {
        if !is_valid_rating(rating) {
            return Err(self.reject(format!("Rating {} is not a half step in [0.5, 5]", rating)));
        }

        let game_id = self.find_review(&review_id)?.game_id;
        self.with_game_lock(game_id, || {
            // Re-read under the game lock; a concurrent delete may have won
            let previous = self.find_review(&review_id)?;
            let mut review = previous.clone();
            review.rating = rating;
            review.verification = verification;
            self.reviews.store_review(review)?;

            self.recompute_or_undo(game_id, RecomputeTrigger::Updated, now, || {
                self.reviews.store_review(previous)
            })?
            .ok_or_else(|| missing_summary(game_id))
        })
    }

    /// Remove a review. Returns the refreshed summary, or `None` if the game
    /// has no reviews left.
    pub fn delete_review(
        &self,
        review_id: ReviewId,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Option<RatingSummary>> {
        let game_id = self.find_review(&review_id)?.game_id;
        self.with_game_lock(game_id, || {
            let removed = self.reviews.remove_review(&review_id)?.ok_or_else(|| {
                anyhow::Error::from(ScoringError::ReviewNotFound {
                    review_id: review_id.to_string(),
                })
            })?;

            self.recompute_or_undo(game_id, RecomputeTrigger::Deleted, now, || {
                self.reviews.store_review(removed)
            })
        })
    }

    /// Rebuild a game's summary from its stored reviews
    pub fn recompute(
        &self,
        game_id: GameId,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Option<RatingSummary>> {
        self.with_game_lock(game_id, || {
            self.recompute_locked(game_id, RecomputeTrigger::Manual, now)
        })
    }

    /// Currently stored summary of a game
    pub fn summary(&self, game_id: &GameId) -> crate::error::Result<Option<RatingSummary>> {
        self.summaries.get_summary(game_id)
    }

    /// All reviews of a game
    pub fn reviews_for_game(&self, game_id: &GameId) -> crate::error::Result<Vec<Review>> {
        self.reviews.get_reviews_for_game(game_id)
    }

    fn recompute_or_undo(
        &self,
        game_id: GameId,
        trigger: RecomputeTrigger,
        now: DateTime<Utc>,
        undo: impl FnOnce() -> crate::error::Result<()>,
    ) -> crate::error::Result<Option<RatingSummary>> {
        let err = match self.recompute_locked(game_id, trigger, now) {
            Ok(summary) => return Ok(summary),
            Err(err) => err,
        };

        warn!(
            "Recompute of game {} failed, undoing {} review: {:#}",
            game_id,
            trigger.as_str(),
            err
        );
        if let Err(undo_err) = undo() {
            error!("Failed to undo review change on game {}: {:#}", game_id, undo_err);
        }

        Err(err)
    }

    fn recompute_locked(
        &self,
        game_id: GameId,
        trigger: RecomputeTrigger,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Option<RatingSummary>> {
        let timer = self
            .metrics
            .as_ref()
            .map(|metrics| (metrics, metrics.start_timer()));
        let reviews = self.reviews.get_reviews_for_game(&game_id)?;

        if reviews.is_empty() {
            if self.summaries.remove_summary(&game_id)? {
                info!("Game {} has no reviews left, summary removed", game_id);
            }
            return Ok(None);
        }

        let summary = self.calculator.summarize(&reviews, now);

        if summary.spike.is_spike {
            warn!(
                "Review spike on game {}: {}/{} reviews are recent ({:.0}%), damping recent weights",
                game_id,
                summary.spike.recent_reviews,
                summary.spike.total_reviews,
                summary.spike.recent_ratio * 100.0
            );
        }

        self.summaries.store_summary(game_id, summary.clone())?;

        if let Some((metrics, timer)) = timer {
            metrics.record_recompute(trigger, &summary, timer.stop());
        }

        info!(
            "Game {} summary {}: {:.2} ({}) from {} reviews",
            game_id,
            trigger.as_str(),
            summary.average_rating,
            summary.label.as_str(),
            summary.total_reviews
        );

        Ok(Some(summary))
    }

    fn validate_review(&self, review: &Review) -> crate::error::Result<()> {
        if !is_valid_rating(review.rating) {
            return Err(self.reject(format!(
                "Rating {} is not a half step in [0.5, 5]",
                review.rating
            )));
        }
        if review.author_id.trim().is_empty() {
            return Err(self.reject("Review has no author".to_string()));
        }
        Ok(())
    }

    fn reject(&self, reason: String) -> anyhow::Error {
        if let Some(metrics) = &self.metrics {
            metrics.record_rejected_review();
        }
        debug!("Rejected review: {}", reason);
        ScoringError::InvalidReview { reason }.into()
    }

    fn find_review(&self, review_id: &ReviewId) -> crate::error::Result<Review> {
        self.reviews.get_review(review_id)?.ok_or_else(|| {
            ScoringError::ReviewNotFound {
                review_id: review_id.to_string(),
            }
            .into()
        })
    }

    /// Run `f` while holding the game's lock
    fn with_game_lock<T>(
        &self,
        game_id: GameId,
        f: impl FnOnce() -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let lock = self.game_lock(game_id)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(poisoned(game_id)),
        };
        self.release_game_lock(game_id, lock);
        result
    }

    fn game_lock(&self, game_id: GameId) -> crate::error::Result<Arc<Mutex<()>>> {
        let mut locks = self
            .game_locks
            .lock()
            .map_err(|_| ScoringError::InternalError {
                message: "Failed to acquire game lock table".to_string(),
            })?;

        Ok(locks.entry(game_id).or_default().clone())
    }

    fn release_game_lock(&self, game_id: GameId, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.game_locks.lock() else {
            return;
        };

        // Held only by the table and this caller: no writer is queued on the game
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&game_id);
        }
    }
}

fn poisoned(game_id: GameId) -> anyhow::Error {
    ScoringError::InternalError {
        message: format!("Lock for game {} is poisoned", game_id),
    }
    .into()
}

fn missing_summary(game_id: GameId) -> anyhow::Error {
    ScoringError::InternalError {
        message: format!("No summary produced for game {}", game_id),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::label::RatingLabel;
    use crate::rating::storage::MockSummaryStore;
    use crate::utils::generate_game_id;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        "2024-06-01T00:00:00Z".parse().unwrap()
    }

    fn review(game_id: GameId, rating: f64, days_old: i64) -> Review {
        Review::new(
            game_id,
            "user1",
            rating,
            Verification::Unverified,
            now() - Duration::days(days_old),
        )
    }

    #[test]
    fn test_submit_updates_summary() {
        let ledger = ReviewLedger::in_memory(ReviewScoreCalculator::default());
        let game_id = generate_game_id();

        let summary = ledger.submit_review(review(game_id, 4.0, 30), now()).unwrap();
        assert_eq!(summary.total_reviews, 1);
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.label, RatingLabel::Positive);

        let summary = ledger.submit_review(review(game_id, 2.0, 20), now()).unwrap();
        assert_eq!(summary.total_reviews, 2);
        assert_eq!(summary.average_rating, 3.0);
        assert_eq!(ledger.summary(&game_id).unwrap(), Some(summary));
    }

    #[test]
    fn test_invalid_reviews_rejected() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let ledger =
            ReviewLedger::in_memory(ReviewScoreCalculator::default()).with_metrics(metrics.clone());
        let game_id = generate_game_id();

        assert!(ledger.submit_review(review(game_id, 0.0, 1), now()).is_err());
        assert!(ledger.submit_review(review(game_id, 4.2, 1), now()).is_err());

        let mut anonymous = review(game_id, 4.0, 1);
        anonymous.author_id = "  ".to_string();
        assert!(ledger.submit_review(anonymous, now()).is_err());

        assert!(ledger.summary(&game_id).unwrap().is_none());
        assert_eq!(metrics.scoring().rejected_reviews_total.get(), 3);
    }

    #[test]
    fn test_duplicate_review_rejected() {
        let ledger = ReviewLedger::in_memory(ReviewScoreCalculator::default());
        let game_id = generate_game_id();
        let first = review(game_id, 4.0, 1);

        ledger.submit_review(first.clone(), now()).unwrap();
        let err = ledger.submit_review(first, now()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_update_review() {
        let ledger = ReviewLedger::in_memory(ReviewScoreCalculator::default());
        let game_id = generate_game_id();
        let original = review(game_id, 1.0, 10);
        let review_id = original.id;

        ledger.submit_review(original, now()).unwrap();
        let summary = ledger
            .update_review(review_id, 5.0, Verification::Steam, now())
            .unwrap();

        assert_eq!(summary.average_rating, 5.0);
        assert_eq!(summary.verified_reviews, 1);
        assert!(ledger
            .update_review(review_id, 9.0, Verification::Steam, now())
            .is_err());
        assert!(ledger
            .update_review(uuid::Uuid::new_v4(), 3.0, Verification::Steam, now())
            .is_err());
    }

    #[test]
    fn test_delete_last_review_clears_summary() {
        let ledger = ReviewLedger::in_memory(ReviewScoreCalculator::default());
        let game_id = generate_game_id();
        let first = review(game_id, 4.0, 10);
        let second = review(game_id, 2.0, 10);
        let (first_id, second_id) = (first.id, second.id);

        ledger.submit_review(first, now()).unwrap();
        ledger.submit_review(second, now()).unwrap();

        let remaining = ledger.delete_review(first_id, now()).unwrap().unwrap();
        assert_eq!(remaining.total_reviews, 1);
        assert_eq!(remaining.average_rating, 2.0);

        assert!(ledger.delete_review(second_id, now()).unwrap().is_none());
        assert!(ledger.summary(&game_id).unwrap().is_none());

        let err = ledger.delete_review(second_id, now()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScoringError>(),
            Some(ScoringError::ReviewNotFound { .. })
        ));
    }

    #[test]
    fn test_recompute_without_reviews() {
        let ledger = ReviewLedger::in_memory(ReviewScoreCalculator::default());
        assert!(ledger.recompute(generate_game_id(), now()).unwrap().is_none());
    }

    #[test]
    fn test_summary_store_calls_per_operation() {
        let mut summaries = MockSummaryStore::new();
        summaries
            .expect_store_summary()
            .times(2)
            .returning(|_, _| Ok(()));
        summaries
            .expect_remove_summary()
            .times(1)
            .returning(|_| Ok(true));

        let ledger = ReviewLedger::new(
            Arc::new(InMemoryReviewStorage::new()),
            Arc::new(summaries),
            Box::new(ReviewScoreCalculator::default()),
        );
        let game_id = generate_game_id();
        let first = review(game_id, 3.0, 3);
        let first_id = first.id;

        ledger.submit_review(first, now()).unwrap();
        ledger.recompute(game_id, now()).unwrap();
        ledger.delete_review(first_id, now()).unwrap();
    }

    fn disk_full() -> anyhow::Error {
        ScoringError::InternalError {
            message: "disk full".to_string(),
        }
        .into()
    }

    #[test]
    fn test_storage_failure_propagates() {
        let mut summaries = MockSummaryStore::new();
        summaries
            .expect_store_summary()
            .returning(|_, _| Err(disk_full()));

        let reviews = Arc::new(InMemoryReviewStorage::new());
        let ledger = ReviewLedger::new(
            reviews.clone(),
            Arc::new(summaries),
            Box::new(ReviewScoreCalculator::default()),
        );
        let game_id = generate_game_id();

        let err = ledger
            .submit_review(review(game_id, 3.0, 1), now())
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));

        // The failed submit leaves no review behind
        assert_eq!(reviews.review_count(&game_id).unwrap(), 0);
        assert!(ledger.game_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_recompute_restores_reviews() {
        let stored = AtomicUsize::new(0);
        let mut summaries = MockSummaryStore::new();
        summaries.expect_store_summary().returning(move |_, _| {
            if stored.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(())
            } else {
                Err(disk_full())
            }
        });

        let reviews = Arc::new(InMemoryReviewStorage::new());
        let ledger = ReviewLedger::new(
            reviews.clone(),
            Arc::new(summaries),
            Box::new(ReviewScoreCalculator::default()),
        );
        let game_id = generate_game_id();
        let first = review(game_id, 4.0, 10);
        let second = review(game_id, 2.0, 10);
        let (first_id, second_id) = (first.id, second.id);

        ledger.submit_review(first.clone(), now()).unwrap();
        ledger.submit_review(second.clone(), now()).unwrap();

        assert!(ledger
            .update_review(first_id, 1.0, Verification::Steam, now())
            .is_err());
        assert_eq!(reviews.get_review(&first_id).unwrap(), Some(first));

        assert!(ledger.delete_review(second_id, now()).is_err());
        assert_eq!(reviews.get_review(&second_id).unwrap(), Some(second));
        assert_eq!(reviews.review_count(&game_id).unwrap(), 2);
    }

    #[test]
    fn test_lock_table_shrinks_when_idle() {
        let ledger = ReviewLedger::in_memory(ReviewScoreCalculator::default());

        for _ in 0..100 {
            let game_id = generate_game_id();
            let first = review(game_id, 4.0, 10);
            let second = review(game_id, 2.0, 10);
            let (first_id, second_id) = (first.id, second.id);

            ledger.submit_review(first, now()).unwrap();
            ledger.submit_review(second, now()).unwrap();
            ledger
                .update_review(first_id, 3.0, Verification::Xbox, now())
                .unwrap();
            ledger.delete_review(first_id, now()).unwrap();
            ledger.delete_review(second_id, now()).unwrap();
        }
        ledger.recompute(generate_game_id(), now()).unwrap();

        assert!(ledger.game_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reconfigure_applies_on_next_recompute() {
        let mut ledger = ReviewLedger::in_memory(ReviewScoreCalculator::default());
        let game_id = generate_game_id();

        ledger.submit_review(review(game_id, 5.0, 30), now()).unwrap();
        assert_eq!(ledger.scoring_config()["average_strategy"], "arithmetic");

        ledger
            .reconfigure(serde_json::json!({ "average_strategy": "bayesian" }))
            .unwrap();
        // Stored summary is untouched until the game is recomputed
        assert_eq!(ledger.summary(&game_id).unwrap().unwrap().average_rating, 5.0);

        let summary = ledger.recompute(game_id, now()).unwrap().unwrap();
        assert!((summary.average_rating - 35.0 / 11.0).abs() < 1e-9);
        assert_eq!(summary.label, RatingLabel::Mixed);

        assert!(ledger
            .reconfigure(serde_json::json!({ "prior_count": -1.0 }))
            .is_err());
        assert_eq!(ledger.scoring_config()["average_strategy"], "bayesian");
    }

    #[test]
    fn test_metrics_recorded_for_recompute() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let ledger =
            ReviewLedger::in_memory(ReviewScoreCalculator::default()).with_metrics(metrics.clone());
        let game_id = generate_game_id();

        ledger.submit_review(review(game_id, 1.0, 0), now()).unwrap();

        let scoring = metrics.scoring();
        assert_eq!(
            scoring
                .summaries_computed_total
                .with_label_values(&["created"])
                .get(),
            1
        );
        // A single fresh review is 100% recent
        assert_eq!(scoring.review_spikes_total.get(), 1);
    }
}
