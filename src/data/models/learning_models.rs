use std::collections::BTreeMap;

use diesel::result::Error as DieselError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::data::models::{ProgressRecord, UserId, WordId};

#[derive(Error, Debug)]
pub enum SrsError {
    #[error("No progress for user {user_id} and word {word_id}")]
    NotFound { user_id: UserId, word_id: WordId },
    #[error("User {0} not found")]
    UserNotFound(UserId),
    #[error("Word {0} not found")]
    WordNotFound(WordId),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Concurrent update for user {user_id} and word {word_id}")]
    Conflict { user_id: UserId, word_id: WordId },
    #[error("Corrupt progress record: {0}")]
    CorruptRecord(String),
    #[error("Database error")]
    Database(DieselError),
}

/// One day's bundle of due reviews and newly assigned words.
#[derive(Debug, Clone, Serialize)]
pub struct DailySession {
    pub review_records: Vec<ProgressRecord>,
    pub new_records: Vec<ProgressRecord>,
    pub total_count: usize,
    /// New words the planner asked the word supply for.
    pub requested_new: usize,
    /// Supplied words whose progress record could not be created.
    pub failed_assignments: usize,
    /// Fewer new words than requested were assigned.
    pub partial: bool,
}

impl DailySession {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LearningStatistics {
    pub total_words: usize,
    pub status_breakdown: BTreeMap<String, usize>,
    pub total_reviews: u64,
    pub total_correct: u64,
    pub overall_accuracy: f64,
    pub words_due_for_review: usize,
    pub new_words: usize,
    pub learning_words: usize,
    pub review_words: usize,
    pub mastered_words: usize,
    pub failed_words: usize,
    pub favorite_words: usize,
    pub flagged_words: usize,
}

/// A progress record as listed to the learner.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEntry {
    #[serde(flatten)]
    pub record: ProgressRecord,
    pub days_until_review: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub value: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    #[validate(length(max = 1000, message = "Note is too long"))]
    pub note: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub full: bool,
}
