use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::data::models::{
    LearningStatistics, LearningStatus, ProgressRecord, ReviewOutcome, SrsError, UserId, WordId,
    MAX_NOTE_LENGTH,
};
use crate::data::repositories::ProgressStore;
use crate::features::learning::statistics::StatisticsReporter;
use crate::spaced_repetition_system::SrsEngine;

/// Per-word operations on top of a progress store. Every write is a
/// read-modify-write guarded by the record version and retried on conflict.
pub struct LearningService<S> {
    store: S,
    settings: Settings,
}

impl<S: ProgressStore> LearningService<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record_word_review(
        &self,
        user_id: UserId,
        word_id: WordId,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, SrsError> {
        let updated = self.update_with_retry(user_id, word_id, |record| {
            SrsEngine::record_review(record, outcome, now)
        })?;

        log::info!(
            "User {} reviewed word {}: correct={}, status={}, next review {}",
            user_id,
            word_id,
            outcome.is_correct,
            updated.status,
            updated.next_review_at
        );

        Ok(updated)
    }

    pub fn words_due(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<ProgressRecord>, SrsError> {
        self.store.find_due(user_id, now)
    }

    pub fn all_progress(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, SrsError> {
        self.store.find_all(user_id)
    }

    pub fn progress_by_status(
        &self,
        user_id: UserId,
        status: LearningStatus,
    ) -> Result<Vec<ProgressRecord>, SrsError> {
        Ok(self
            .store
            .find_all(user_id)?
            .into_iter()
            .filter(|record| record.status == status)
            .collect())
    }

    pub fn set_flagged(&self, user_id: UserId, word_id: WordId, flagged: bool) -> Result<ProgressRecord, SrsError> {
        self.update_with_retry(user_id, word_id, |record| {
            Ok(ProgressRecord {
                is_flagged: flagged,
                ..record.clone()
            })
        })
    }

    pub fn set_favorite(&self, user_id: UserId, word_id: WordId, favorite: bool) -> Result<ProgressRecord, SrsError> {
        self.update_with_retry(user_id, word_id, |record| {
            Ok(ProgressRecord {
                is_favorite: favorite,
                ..record.clone()
            })
        })
    }

    /// A blank note clears the stored one.
    pub fn set_note(&self, user_id: UserId, word_id: WordId, note: &str) -> Result<ProgressRecord, SrsError> {
        if note.chars().count() > MAX_NOTE_LENGTH {
            return Err(SrsError::InvalidArgument(format!(
                "Note cannot exceed {} characters",
                MAX_NOTE_LENGTH
            )));
        }

        let note = note.trim();
        let notes = (!note.is_empty()).then(|| note.to_string());

        self.update_with_retry(user_id, word_id, |record| {
            Ok(ProgressRecord {
                notes: notes.clone(),
                ..record.clone()
            })
        })
    }

    pub fn reset_word(&self, user_id: UserId, word_id: WordId, now: DateTime<Utc>) -> Result<ProgressRecord, SrsError> {
        let updated =
            self.update_with_retry(user_id, word_id, |record| Ok(SrsEngine::reset(record, now)))?;
        log::info!("Reset schedule of word {} for user {}", word_id, user_id);
        Ok(updated)
    }

    pub fn full_reset_word(
        &self,
        user_id: UserId,
        word_id: WordId,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, SrsError> {
        let updated = self.update_with_retry(user_id, word_id, |record| {
            Ok(SrsEngine::full_reset(record, now))
        })?;
        log::info!("Fully reset word {} for user {}", word_id, user_id);
        Ok(updated)
    }

    pub fn statistics(&self, user_id: UserId, now: DateTime<Utc>) -> Result<LearningStatistics, SrsError> {
        let records = self.store.find_all(user_id)?;
        Ok(StatisticsReporter::summarize(&records, now))
    }

    fn update_with_retry<F>(&self, user_id: UserId, word_id: WordId, change: F) -> Result<ProgressRecord, SrsError>
    where
        F: Fn(&ProgressRecord) -> Result<ProgressRecord, SrsError>,
    {
        let mut attempt = 0;
        loop {
            let current = self
                .store
                .find(user_id, word_id)?
                .ok_or(SrsError::NotFound { user_id, word_id })?;
            let next = change(&current)?;

            match self.store.save(&next) {
                Err(SrsError::Conflict { .. }) if attempt < self.settings.review_retry_limit => {
                    attempt += 1;
                    log::warn!(
                        "Version conflict on word {} for user {}, retry {}",
                        word_id,
                        user_id,
                        attempt
                    );
                }
                result => return result,
            }
        }
    }
}
