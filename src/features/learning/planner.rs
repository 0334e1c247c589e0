use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::data::models::{DailySession, SrsError, UserProfile};
use crate::data::repositories::ProgressStore;
use crate::features::vocabulary::WordSupply;

/// Builds the daily mix of due reviews and new words.
pub struct SessionPlanner<S, W> {
    store: S,
    supply: W,
}

impl<S: ProgressStore, W: WordSupply> SessionPlanner<S, W> {
    pub fn new(store: S, supply: W) -> Self {
        Self { store, supply }
    }

    /// Due reviews are always included; new words only fill what is left of
    /// `quota`. A short or failing word supply degrades the session instead
    /// of failing it.
    pub fn plan_daily_session(
        &self,
        profile: &UserProfile,
        quota: i32,
        now: DateTime<Utc>,
    ) -> Result<DailySession, SrsError> {
        let review_records = self.store.find_due(profile.id, now)?;
        let due_count = i64::try_from(review_records.len()).unwrap_or(i64::MAX);
        let remaining = (i64::from(quota) - due_count).max(0) as usize;

        let mut new_records = Vec::new();
        let mut failed_assignments = 0;

        if remaining > 0 {
            let known = self.store.word_ids(profile.id)?;

            let supplied = match self.supply.fetch_words(profile, remaining, &known) {
                Ok(ids) => ids,
                Err(e) => {
                    log::warn!("Word supply failed for user {}: {}", profile.id, e);
                    Vec::new()
                }
            };

            let mut seen = HashSet::new();
            for word_id in supplied {
                if new_records.len() >= remaining {
                    break;
                }
                if known.contains(&word_id) || !seen.insert(word_id) {
                    continue;
                }

                match self.store.create(profile.id, word_id, now) {
                    Ok(record) => new_records.push(record),
                    Err(e) => {
                        failed_assignments += 1;
                        log::error!(
                            "Failed to assign word {} to user {}: {}",
                            word_id,
                            profile.id,
                            e
                        );
                    }
                }
            }

            if new_records.len() < remaining {
                log::warn!(
                    "User {} got {} of {} new words",
                    profile.id,
                    new_records.len(),
                    remaining
                );
            }
        }

        let total_count = review_records.len() + new_records.len();
        log::info!(
            "Daily learning session for user {}: {} reviews, {} new",
            profile.id,
            review_records.len(),
            new_records.len()
        );

        Ok(DailySession {
            partial: new_records.len() < remaining,
            review_records,
            new_records,
            total_count,
            requested_new: remaining,
            failed_assignments,
        })
    }
}
