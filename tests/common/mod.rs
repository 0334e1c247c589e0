#![allow(dead_code)]

use chrono::Utc;
use tempfile::TempDir;

use vocala::config::Settings;
use vocala::data::database;
use vocala::data::models::{NewUser, NewWord, UserProfile, WordId};
use vocala::data::repositories::{UserRepository, WordRepository};
use vocala::features::vocabulary::normalize_word;
use vocala::DbPool;

pub struct TestDb {
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
    pub pool: DbPool,
    pub settings: Settings,
}

pub fn setup() -> TestDb {
    setup_with(|_| {})
}

/// Like `setup`, with the test's own pool size or timeouts.
pub fn setup_with(customize: impl FnOnce(&mut Settings)) -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings {
        database_url: dir.path().join("vocala.db").to_string_lossy().into_owned(),
        db_pool_size: 4,
        store_timeout_ms: 2_000,
        ..Settings::default()
    };
    customize(&mut settings);
    let pool = database::connect(&settings).unwrap();

    TestDb {
        _dir: dir,
        pool,
        settings,
    }
}

pub fn seed_user(pool: &DbPool, daily_word_count: i32, difficulty: &str) -> UserProfile {
    let mut conn = pool.get().unwrap();
    UserRepository::create_user(
        &mut conn,
        &NewUser {
            daily_word_count,
            difficulty_level: difficulty,
            language_code: Some("tr"),
            is_active: true,
            notifications_enabled: true,
            created_at: Utc::now().naive_utc(),
        },
    )
    .unwrap()
}

pub fn seed_word(pool: &DbPool, english: &str, difficulty: &str, verified: bool) -> WordId {
    let mut conn = pool.get().unwrap();
    let normalized = normalize_word(english);
    WordRepository::insert(
        &mut conn,
        &NewWord {
            english_word: english,
            normalized_word: &normalized,
            turkish_translation: "çeviri",
            part_of_speech: "noun",
            definition: None,
            difficulty_level: difficulty,
            is_verified: verified,
            usage_count: 0,
            created_at: Utc::now().naive_utc(),
        },
    )
    .unwrap()
    .id
}
