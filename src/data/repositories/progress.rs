use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};

use crate::data::models::{
    NewProgress, ProgressRecord, ProgressRow, SrsError, UserId, WordId,
};
use crate::schema::user_word_progress;
use crate::DbPool;

/// Persistence for progress records.
///
/// `create` must be idempotent per (user, word) and `save` must refuse to
/// overwrite a record whose `version` changed since it was read.
pub trait ProgressStore: Send + Sync {
    fn find(&self, user_id: UserId, word_id: WordId) -> Result<Option<ProgressRecord>, SrsError>;

    /// Returns the existing record for the pair, creating it due at `now`
    /// if absent.
    fn create(&self, user_id: UserId, word_id: WordId, now: DateTime<Utc>) -> Result<ProgressRecord, SrsError>;

    /// Writes `record` if its version is still current and returns the
    /// stored value with the bumped version.
    fn save(&self, record: &ProgressRecord) -> Result<ProgressRecord, SrsError>;

    /// Records with `next_review_at <= now`, earliest first.
    fn find_due(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<ProgressRecord>, SrsError>;

    fn find_all(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, SrsError>;

    fn word_ids(&self, user_id: UserId) -> Result<HashSet<WordId>, SrsError> {
        Ok(self
            .find_all(user_id)?
            .into_iter()
            .map(|record| record.word_id)
            .collect())
    }
}

impl<T: ProgressStore + ?Sized> ProgressStore for Arc<T> {
    fn find(&self, user_id: UserId, word_id: WordId) -> Result<Option<ProgressRecord>, SrsError> {
        (**self).find(user_id, word_id)
    }

    fn create(&self, user_id: UserId, word_id: WordId, now: DateTime<Utc>) -> Result<ProgressRecord, SrsError> {
        (**self).create(user_id, word_id, now)
    }

    fn save(&self, record: &ProgressRecord) -> Result<ProgressRecord, SrsError> {
        (**self).save(record)
    }

    fn find_due(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<ProgressRecord>, SrsError> {
        (**self).find_due(user_id, now)
    }

    fn find_all(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, SrsError> {
        (**self).find_all(user_id)
    }

    fn word_ids(&self, user_id: UserId) -> Result<HashSet<WordId>, SrsError> {
        (**self).word_ids(user_id)
    }
}

/// SQLite-backed store. Each call checks a connection out of the pool and
/// returns it on drop, whichever way the call exits.
#[derive(Clone)]
pub struct DieselProgressStore {
    pool: DbPool,
}

impl DieselProgressStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, SrsError> {
        self.pool.get().map_err(|e| {
            log::error!("Failed to get DB connection: {}", e);
            SrsError::from(e)
        })
    }

    fn load(rows: Vec<ProgressRow>) -> Result<Vec<ProgressRecord>, SrsError> {
        rows.into_iter().map(ProgressRecord::try_from).collect()
    }
}

impl ProgressStore for DieselProgressStore {
    fn find(&self, user_id: UserId, word_id: WordId) -> Result<Option<ProgressRecord>, SrsError> {
        let mut conn = self.conn()?;

        user_word_progress::table
            .filter(user_word_progress::user_id.eq(user_id))
            .filter(user_word_progress::word_id.eq(word_id))
            .select(ProgressRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(ProgressRecord::try_from)
            .transpose()
    }

    fn create(&self, user_id: UserId, word_id: WordId, now: DateTime<Utc>) -> Result<ProgressRecord, SrsError> {
        let mut conn = self.conn()?;

        let inserted = diesel::insert_into(user_word_progress::table)
            .values(&NewProgress::assigned(user_id, word_id, now.naive_utc()))
            .on_conflict((user_word_progress::user_id, user_word_progress::word_id))
            .do_nothing()
            .execute(&mut conn)?;

        if inserted == 0 {
            log::debug!("Progress for user {} word {} already exists", user_id, word_id);
        }

        let row = user_word_progress::table
            .filter(user_word_progress::user_id.eq(user_id))
            .filter(user_word_progress::word_id.eq(word_id))
            .select(ProgressRow::as_select())
            .first(&mut conn)?;

        ProgressRecord::try_from(row)
    }

    fn save(&self, record: &ProgressRecord) -> Result<ProgressRecord, SrsError> {
        let mut conn = self.conn()?;

        let mut stored = record.clone();
        stored.version = record.version + 1;
        stored.updated_at = Utc::now();
        let row = ProgressRow::try_from(&stored)?;

        let updated = diesel::update(
            user_word_progress::table
                .filter(user_word_progress::id.eq(record.id))
                .filter(user_word_progress::version.eq(record.version)),
        )
        .set(&row)
        .execute(&mut conn)?;

        if updated == 1 {
            return Ok(stored);
        }

        let exists = diesel::select(diesel::dsl::exists(
            user_word_progress::table.filter(user_word_progress::id.eq(record.id)),
        ))
        .get_result::<bool>(&mut conn)?;

        if exists {
            Err(SrsError::Conflict {
                user_id: record.user_id,
                word_id: record.word_id,
            })
        } else {
            Err(SrsError::NotFound {
                user_id: record.user_id,
                word_id: record.word_id,
            })
        }
    }

    fn find_due(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<ProgressRecord>, SrsError> {
        let mut conn = self.conn()?;

        let rows = user_word_progress::table
            .filter(user_word_progress::user_id.eq(user_id))
            .filter(user_word_progress::next_review_at.le(now.naive_utc()))
            .order_by((user_word_progress::next_review_at.asc(), user_word_progress::id.asc()))
            .select(ProgressRow::as_select())
            .load(&mut conn)?;

        Self::load(rows)
    }

    fn find_all(&self, user_id: UserId) -> Result<Vec<ProgressRecord>, SrsError> {
        let mut conn = self.conn()?;

        let rows = user_word_progress::table
            .filter(user_word_progress::user_id.eq(user_id))
            .order_by(user_word_progress::next_review_at.asc())
            .select(ProgressRow::as_select())
            .load(&mut conn)?;

        Self::load(rows)
    }

    fn word_ids(&self, user_id: UserId) -> Result<HashSet<WordId>, SrsError> {
        let mut conn = self.conn()?;

        let ids = user_word_progress::table
            .filter(user_word_progress::user_id.eq(user_id))
            .select(user_word_progress::word_id)
            .load::<i32>(&mut conn)?;

        Ok(ids.into_iter().collect())
    }
}
