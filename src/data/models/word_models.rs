use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{examples, words};

/// A cached vocabulary entry.
#[derive(Debug, Clone, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = words)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Word {
    pub id: i32,
    pub english_word: String,
    #[serde(skip_serializing)]
    pub normalized_word: String,
    pub turkish_translation: String,
    pub part_of_speech: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub difficulty_level: String,
    pub is_verified: bool,
    pub usage_count: i32,
    pub created_at: NaiveDateTime,
    pub last_used_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = words)]
pub struct NewWord<'a> {
    pub english_word: &'a str,
    pub normalized_word: &'a str,
    pub turkish_translation: &'a str,
    pub part_of_speech: &'a str,
    pub definition: Option<&'a str>,
    pub difficulty_level: &'a str,
    pub is_verified: bool,
    pub usage_count: i32,
    pub created_at: NaiveDateTime,
}

/// An example sentence attached to a cached word.
#[derive(Debug, Clone, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = examples)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Example {
    pub id: i32,
    #[serde(skip_serializing)]
    pub word_id: i32,
    pub english_sentence: String,
    pub turkish_translation: String,
    pub difficulty_level: String,
    pub is_verified: bool,
    pub usage_count: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = examples)]
pub struct NewExample<'a> {
    pub word_id: i32,
    pub english_sentence: &'a str,
    pub turkish_translation: &'a str,
    pub difficulty_level: &'a str,
    pub is_verified: bool,
    pub usage_count: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct WordWithExamples {
    #[serde(flatten)]
    pub word: Word,
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedExample {
    pub english_sentence: String,
    pub turkish_translation: String,
}

/// A word/example tuple produced by the generative provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedWord {
    pub english_word: String,
    pub turkish_translation: String,
    pub part_of_speech: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub examples: Vec<GeneratedExample>,
}
