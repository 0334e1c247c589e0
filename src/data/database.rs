use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;

use crate::config::Settings;
use crate::data::models::SrsError;
use crate::DbPool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    daily_word_count INTEGER NOT NULL DEFAULT 5,
    difficulty_level TEXT NOT NULL DEFAULT 'B1_B2',
    language_code TEXT,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    notifications_enabled BOOLEAN NOT NULL DEFAULT 1,
    last_daily_words_sent TIMESTAMP,
    learning_streak INTEGER NOT NULL DEFAULT 0 CHECK (learning_streak >= 0),
    total_words_learned INTEGER NOT NULL DEFAULT 0 CHECK (total_words_learned >= 0),
    last_activity TIMESTAMP,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    english_word TEXT NOT NULL,
    normalized_word TEXT NOT NULL,
    turkish_translation TEXT NOT NULL,
    part_of_speech TEXT NOT NULL,
    definition TEXT,
    difficulty_level TEXT NOT NULL DEFAULT 'B1_B2',
    is_verified BOOLEAN NOT NULL DEFAULT 0,
    usage_count INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL,
    last_used_at TIMESTAMP
);

CREATE TABLE IF NOT EXISTS examples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    english_sentence TEXT NOT NULL,
    turkish_translation TEXT NOT NULL,
    difficulty_level TEXT NOT NULL DEFAULT 'B1_B2',
    is_verified BOOLEAN NOT NULL DEFAULT 0,
    usage_count INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS user_word_progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'new',
    srs_level INTEGER NOT NULL DEFAULT 0 CHECK (srs_level >= 0),
    srs_interval INTEGER NOT NULL DEFAULT 1 CHECK (srs_interval >= 1),
    ease_factor DOUBLE NOT NULL DEFAULT 2.5 CHECK (ease_factor >= 1.3 AND ease_factor <= 3.0),
    total_reviews INTEGER NOT NULL DEFAULT 0,
    correct_reviews INTEGER NOT NULL DEFAULT 0,
    consecutive_correct INTEGER NOT NULL DEFAULT 0,
    consecutive_incorrect INTEGER NOT NULL DEFAULT 0,
    accuracy_rate DOUBLE CHECK (accuracy_rate >= 0.0 AND accuracy_rate <= 1.0),
    average_response_time DOUBLE,
    difficulty_rating INTEGER CHECK (difficulty_rating >= 1 AND difficulty_rating <= 5),
    first_seen_at TIMESTAMP NOT NULL,
    first_correct_at TIMESTAMP,
    mastered_at TIMESTAMP,
    next_review_at TIMESTAMP NOT NULL,
    last_reviewed_at TIMESTAMP,
    is_favorite BOOLEAN NOT NULL DEFAULT 0,
    is_flagged BOOLEAN NOT NULL DEFAULT 0,
    notes TEXT CHECK (length(notes) <= 1000),
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL,
    version INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_user_word_unique ON user_word_progress(user_id, word_id);
CREATE INDEX IF NOT EXISTS idx_progress_due ON user_word_progress(user_id, next_review_at);
CREATE INDEX IF NOT EXISTS idx_progress_status ON user_word_progress(user_id, status);
CREATE INDEX IF NOT EXISTS idx_word_difficulty ON words(difficulty_level, is_verified, usage_count);
CREATE INDEX IF NOT EXISTS idx_word_normalized ON words(normalized_word);
CREATE INDEX IF NOT EXISTS idx_example_word ON examples(word_id);
CREATE INDEX IF NOT EXISTS idx_user_activity ON users(is_active, last_activity);
"#;

/// Per-connection pragmas applied on checkout.
#[derive(Debug)]
struct SqlitePragmas {
    busy_timeout_ms: u64,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds the connection pool with bounded waits and creates missing tables.
pub fn connect(settings: &Settings) -> Result<DbPool, SrsError> {
    let manager = ConnectionManager::<SqliteConnection>::new(settings.database_url.as_str());
    let pool = Pool::builder()
        .max_size(settings.db_pool_size)
        .connection_timeout(settings.store_timeout())
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout_ms: settings.store_timeout_ms,
        }))
        .build(manager)?;

    init_schema(&pool)?;
    log::info!("Database ready at {}", settings.database_url);
    Ok(pool)
}

pub fn init_schema(pool: &DbPool) -> Result<(), SrsError> {
    let mut conn = pool.get()?;
    conn.batch_execute(SCHEMA)?;
    Ok(())
}
