use chrono::NaiveDateTime;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Integer;

use crate::data::models::{NewWord, Word, WordId};
use crate::schema::words;

pub struct WordRepository;

impl WordRepository {
    /// Verified words of one difficulty, least used first.
    pub fn verified_by_difficulty(
        conn: &mut SqliteConnection,
        difficulty_level: &str,
        limit: usize,
        exclude_ids: &[WordId],
    ) -> Result<Vec<Word>, diesel::result::Error> {
        let mut query = words::table
            .filter(words::difficulty_level.eq(difficulty_level))
            .filter(words::is_verified.eq(true))
            .into_boxed();

        if !exclude_ids.is_empty() {
            query = query.filter(words::id.ne_all(exclude_ids.to_vec()));
        }

        query
            .order_by((words::usage_count.asc(), words::id.asc()))
            .limit(limit as i64)
            .select(Word::as_select())
            .load(conn)
    }

    pub fn find_by_normalized(
        conn: &mut SqliteConnection,
        normalized: &str,
    ) -> Result<Option<Word>, diesel::result::Error> {
        words::table
            .filter(words::normalized_word.eq(normalized))
            .order_by((words::is_verified.desc(), words::id.asc()))
            .select(Word::as_select())
            .first(conn)
            .optional()
    }

    pub fn insert(
        conn: &mut SqliteConnection,
        word: &NewWord<'_>,
    ) -> Result<Word, diesel::result::Error> {
        diesel::insert_into(words::table)
            .values(word)
            .execute(conn)?;

        let word_id = diesel::select(sql::<Integer>("last_insert_rowid()"))
            .get_result::<i32>(conn)?;

        Self::find_by_id(conn, word_id)
    }

    pub fn find_by_id(
        conn: &mut SqliteConnection,
        word_id: WordId,
    ) -> Result<Word, diesel::result::Error> {
        words::table
            .find(word_id)
            .select(Word::as_select())
            .first(conn)
    }

    /// "Mark used": bumps usage counters on served words.
    pub fn increment_usage(
        conn: &mut SqliteConnection,
        word_ids: &[WordId],
        now: NaiveDateTime,
    ) -> Result<usize, diesel::result::Error> {
        if word_ids.is_empty() {
            return Ok(0);
        }

        diesel::update(words::table.filter(words::id.eq_any(word_ids.to_vec())))
            .set((
                words::usage_count.eq(words::usage_count + 1),
                words::last_used_at.eq(Some(now)),
            ))
            .execute(conn)
    }
}
