use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::data::models::SrsError;
use crate::schema::user_word_progress;

pub type UserId = i32;
pub type WordId = i32;

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 3.0;
pub const MAX_NOTE_LENGTH: usize = 1000;

/// Learning stage of a word for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStatus {
    New,
    Learning,
    Review,
    Mastered,
    Failed,
}

impl LearningStatus {
    pub const ALL: [LearningStatus; 5] = [
        LearningStatus::New,
        LearningStatus::Learning,
        LearningStatus::Review,
        LearningStatus::Mastered,
        LearningStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LearningStatus::New => "new",
            LearningStatus::Learning => "learning",
            LearningStatus::Review => "review",
            LearningStatus::Mastered => "mastered",
            LearningStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for LearningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningStatus {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LearningStatus::New),
            "learning" => Ok(LearningStatus::Learning),
            "review" => Ok(LearningStatus::Review),
            "mastered" => Ok(LearningStatus::Mastered),
            "failed" => Ok(LearningStatus::Failed),
            other => Err(SrsError::InvalidArgument(format!(
                "Unknown learning status: {}",
                other
            ))),
        }
    }
}

/// SRS state of one word for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRecord {
    pub id: i32,
    pub user_id: UserId,
    pub word_id: WordId,
    pub status: LearningStatus,
    pub srs_level: u32,
    /// Days until the next review.
    pub srs_interval: u32,
    pub ease_factor: f64,
    pub total_reviews: u32,
    pub correct_reviews: u32,
    pub consecutive_correct: u32,
    pub consecutive_incorrect: u32,
    pub accuracy_rate: Option<f64>,
    /// Seconds, smoothed with an exponential moving average.
    pub average_response_time: Option<f64>,
    pub difficulty_rating: Option<u8>,
    pub first_seen_at: DateTime<Utc>,
    pub first_correct_at: Option<DateTime<Utc>>,
    pub mastered_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub is_favorite: bool,
    pub is_flagged: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i32,
}

impl ProgressRecord {
    /// A freshly assigned word, due immediately.
    pub fn new(id: i32, user_id: UserId, word_id: WordId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            word_id,
            status: LearningStatus::New,
            srs_level: 0,
            srs_interval: 1,
            ease_factor: INITIAL_EASE_FACTOR,
            total_reviews: 0,
            correct_reviews: 0,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            accuracy_rate: None,
            average_response_time: None,
            difficulty_rating: None,
            first_seen_at: now,
            first_correct_at: None,
            mastered_at: None,
            next_review_at: now,
            last_reviewed_at: None,
            is_favorite: false,
            is_flagged: false,
            notes: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

/// One answer given by the user.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct ReviewOutcome {
    pub is_correct: bool,
    #[validate(range(min = 0.0, message = "Response time cannot be negative"))]
    pub response_time: Option<f64>,
    #[validate(range(min = 1, max = 5, message = "Difficulty rating must be between 1 and 5"))]
    pub difficulty_rating: Option<i32>,
}

impl ReviewOutcome {
    pub fn correct() -> Self {
        Self {
            is_correct: true,
            response_time: None,
            difficulty_rating: None,
        }
    }

    pub fn incorrect() -> Self {
        Self {
            is_correct: false,
            response_time: None,
            difficulty_rating: None,
        }
    }

    pub fn with_response_time(mut self, seconds: f64) -> Self {
        self.response_time = Some(seconds);
        self
    }

    pub fn with_difficulty(mut self, rating: i32) -> Self {
        self.difficulty_rating = Some(rating);
        self
    }
}

/// Row representation of `user_word_progress`.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = user_word_progress)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProgressRow {
    pub id: i32,
    pub user_id: i32,
    pub word_id: i32,
    pub status: String,
    pub srs_level: i32,
    pub srs_interval: i32,
    pub ease_factor: f64,
    pub total_reviews: i32,
    pub correct_reviews: i32,
    pub consecutive_correct: i32,
    pub consecutive_incorrect: i32,
    pub accuracy_rate: Option<f64>,
    pub average_response_time: Option<f64>,
    pub difficulty_rating: Option<i32>,
    pub first_seen_at: NaiveDateTime,
    pub first_correct_at: Option<NaiveDateTime>,
    pub mastered_at: Option<NaiveDateTime>,
    pub next_review_at: NaiveDateTime,
    pub last_reviewed_at: Option<NaiveDateTime>,
    pub is_favorite: bool,
    pub is_flagged: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_word_progress)]
pub struct NewProgress<'a> {
    pub user_id: i32,
    pub word_id: i32,
    pub status: &'a str,
    pub srs_level: i32,
    pub srs_interval: i32,
    pub ease_factor: f64,
    pub total_reviews: i32,
    pub correct_reviews: i32,
    pub consecutive_correct: i32,
    pub consecutive_incorrect: i32,
    pub first_seen_at: NaiveDateTime,
    pub next_review_at: NaiveDateTime,
    pub is_favorite: bool,
    pub is_flagged: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}

impl NewProgress<'_> {
    pub fn assigned(user_id: UserId, word_id: WordId, now: NaiveDateTime) -> Self {
        Self {
            user_id,
            word_id,
            status: LearningStatus::New.as_str(),
            srs_level: 0,
            srs_interval: 1,
            ease_factor: INITIAL_EASE_FACTOR,
            total_reviews: 0,
            correct_reviews: 0,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            first_seen_at: now,
            next_review_at: now,
            is_favorite: false,
            is_flagged: false,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

fn unsigned(field: &str, value: i32) -> Result<u32, SrsError> {
    u32::try_from(value)
        .map_err(|_| SrsError::CorruptRecord(format!("{} is negative: {}", field, value)))
}

fn to_i32(field: &str, value: u32) -> Result<i32, SrsError> {
    i32::try_from(value)
        .map_err(|_| SrsError::InvalidArgument(format!("{} is out of range: {}", field, value)))
}

impl TryFrom<ProgressRow> for ProgressRecord {
    type Error = SrsError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        let difficulty_rating = row
            .difficulty_rating
            .map(|rating| {
                u8::try_from(rating).map_err(|_| {
                    SrsError::CorruptRecord(format!("difficulty_rating out of range: {}", rating))
                })
            })
            .transpose()?;

        Ok(ProgressRecord {
            id: row.id,
            user_id: row.user_id,
            word_id: row.word_id,
            status: row
                .status
                .parse()
                .map_err(|_| SrsError::CorruptRecord(format!("unknown status {}", row.status)))?,
            srs_level: unsigned("srs_level", row.srs_level)?,
            srs_interval: unsigned("srs_interval", row.srs_interval)?,
            ease_factor: row.ease_factor,
            total_reviews: unsigned("total_reviews", row.total_reviews)?,
            correct_reviews: unsigned("correct_reviews", row.correct_reviews)?,
            consecutive_correct: unsigned("consecutive_correct", row.consecutive_correct)?,
            consecutive_incorrect: unsigned("consecutive_incorrect", row.consecutive_incorrect)?,
            accuracy_rate: row.accuracy_rate,
            average_response_time: row.average_response_time,
            difficulty_rating,
            first_seen_at: row.first_seen_at.and_utc(),
            first_correct_at: row.first_correct_at.map(|t| t.and_utc()),
            mastered_at: row.mastered_at.map(|t| t.and_utc()),
            next_review_at: row.next_review_at.and_utc(),
            last_reviewed_at: row.last_reviewed_at.map(|t| t.and_utc()),
            is_favorite: row.is_favorite,
            is_flagged: row.is_flagged,
            notes: row.notes,
            created_at: row.created_at.and_utc(),
            updated_at: row.updated_at.and_utc(),
            version: row.version,
        })
    }
}

impl TryFrom<&ProgressRecord> for ProgressRow {
    type Error = SrsError;

    fn try_from(record: &ProgressRecord) -> Result<Self, Self::Error> {
        Ok(ProgressRow {
            id: record.id,
            user_id: record.user_id,
            word_id: record.word_id,
            status: record.status.as_str().to_string(),
            srs_level: to_i32("srs_level", record.srs_level)?,
            srs_interval: to_i32("srs_interval", record.srs_interval)?,
            ease_factor: record.ease_factor,
            total_reviews: to_i32("total_reviews", record.total_reviews)?,
            correct_reviews: to_i32("correct_reviews", record.correct_reviews)?,
            consecutive_correct: to_i32("consecutive_correct", record.consecutive_correct)?,
            consecutive_incorrect: to_i32("consecutive_incorrect", record.consecutive_incorrect)?,
            accuracy_rate: record.accuracy_rate,
            average_response_time: record.average_response_time,
            difficulty_rating: record.difficulty_rating.map(i32::from),
            first_seen_at: record.first_seen_at.naive_utc(),
            first_correct_at: record.first_correct_at.map(|t| t.naive_utc()),
            mastered_at: record.mastered_at.map(|t| t.naive_utc()),
            next_review_at: record.next_review_at.naive_utc(),
            last_reviewed_at: record.last_reviewed_at.map(|t| t.naive_utc()),
            is_favorite: record.is_favorite,
            is_flagged: record.is_flagged,
            notes: record.notes.clone(),
            created_at: record.created_at.naive_utc(),
            updated_at: record.updated_at.naive_utc(),
            version: record.version,
        })
    }
}
