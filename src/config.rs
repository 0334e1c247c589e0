use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    NotPositive { key: &'static str },
}

/// Runtime settings, loaded once at startup and handed to every component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// New-word quota for users without their own preference.
    pub daily_word_count: i32,
    pub default_difficulty: String,
    /// Upper bound for pool checkout and SQLite lock waits.
    pub store_timeout_ms: u64,
    pub db_pool_size: u32,
    pub review_retry_limit: u32,
    pub dispatch_interval_secs: u64,
    pub dispatch_cooldown_hours: i64,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "vocala.db".into(),
            bind_address: "127.0.0.1:5000".into(),
            daily_word_count: 5,
            default_difficulty: "B1_B2".into(),
            store_timeout_ms: 5_000,
            db_pool_size: 8,
            review_retry_limit: 3,
            dispatch_interval_secs: 3_600,
            dispatch_cooldown_hours: 20,
            request_timeout_secs: 30,
            log_level: "info".into(),
        }
    }
}

impl Settings {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let settings = Settings {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            daily_word_count: parse_or(&lookup, "DAILY_WORD_COUNT", defaults.daily_word_count)?,
            default_difficulty: lookup("DEFAULT_DIFFICULTY").unwrap_or(defaults.default_difficulty),
            store_timeout_ms: parse_or(&lookup, "STORE_TIMEOUT_MS", defaults.store_timeout_ms)?,
            db_pool_size: parse_or(&lookup, "DB_POOL_SIZE", defaults.db_pool_size)?,
            review_retry_limit: parse_or(&lookup, "REVIEW_RETRY_LIMIT", defaults.review_retry_limit)?,
            dispatch_interval_secs: parse_or(
                &lookup,
                "DISPATCH_INTERVAL_SECS",
                defaults.dispatch_interval_secs,
            )?,
            dispatch_cooldown_hours: parse_or(
                &lookup,
                "DISPATCH_COOLDOWN_HOURS",
                defaults.dispatch_cooldown_hours,
            )?,
            request_timeout_secs: parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        if settings.store_timeout_ms == 0 {
            return Err(ConfigError::NotPositive { key: "STORE_TIMEOUT_MS" });
        }
        if settings.db_pool_size == 0 {
            return Err(ConfigError::NotPositive { key: "DB_POOL_SIZE" });
        }
        if settings.dispatch_interval_secs == 0 {
            return Err(ConfigError::NotPositive { key: "DISPATCH_INTERVAL_SECS" });
        }

        Ok(settings)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}
