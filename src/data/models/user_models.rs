use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schema::users;

/// Learner preferences the planner and word supply need.
#[derive(Debug, Clone, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserProfile {
    pub id: i32,
    pub daily_word_count: i32,
    pub difficulty_level: String,
    pub language_code: Option<String>,
    pub is_active: bool,
    pub notifications_enabled: bool,
    pub last_daily_words_sent: Option<NaiveDateTime>,
    /// Consecutive days with at least one review.
    pub learning_streak: i32,
    pub total_words_learned: i32,
    pub last_activity: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub daily_word_count: i32,
    pub difficulty_level: &'a str,
    pub language_code: Option<&'a str>,
    pub is_active: bool,
    pub notifications_enabled: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(range(min = 0, max = 100, message = "Daily word count must be between 0 and 100"))]
    pub daily_word_count: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub difficulty_level: Option<String>,
    #[validate(length(min = 2, max = 10))]
    pub language_code: Option<String>,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePreferencesRequest {
    #[validate(range(min = 0, max = 100, message = "Daily word count must be between 0 and 100"))]
    pub daily_word_count: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub difficulty_level: Option<String>,
    pub notifications_enabled: Option<bool>,
}

/// Only the `Some` fields are written.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct PreferencesChangeset<'a> {
    pub daily_word_count: Option<i32>,
    pub difficulty_level: Option<&'a str>,
    pub notifications_enabled: Option<bool>,
}

impl<'a> From<&'a UpdatePreferencesRequest> for PreferencesChangeset<'a> {
    fn from(request: &'a UpdatePreferencesRequest) -> Self {
        Self {
            daily_word_count: request.daily_word_count,
            difficulty_level: request.difficulty_level.as_deref(),
            notifications_enabled: request.notifications_enabled,
        }
    }
}

impl PreferencesChangeset<'_> {
    pub fn is_empty(&self) -> bool {
        self.daily_word_count.is_none()
            && self.difficulty_level.is_none()
            && self.notifications_enabled.is_none()
    }
}

fn default_true() -> bool {
    true
}
