use chrono::NaiveDateTime;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Integer;

use crate::data::models::{NewUser, PreferencesChangeset, UserId, UserProfile};
use crate::schema::users;

pub struct UserRepository;

impl UserRepository {
    pub fn find_by_id(
        conn: &mut SqliteConnection,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, diesel::result::Error> {
        users::table
            .find(user_id)
            .select(UserProfile::as_select())
            .first(conn)
            .optional()
    }

    /// `last_insert_rowid()` is tracked per connection, so concurrent
    /// inserts on other connections cannot leak into the result.
    pub fn create_user(
        conn: &mut SqliteConnection,
        new_user: &NewUser<'_>,
    ) -> Result<UserProfile, diesel::result::Error> {
        diesel::insert_into(users::table)
            .values(new_user)
            .execute(conn)?;

        let user_id = diesel::select(sql::<Integer>("last_insert_rowid()"))
            .get_result::<i32>(conn)?;

        users::table
            .find(user_id)
            .select(UserProfile::as_select())
            .first(conn)
    }

    pub fn update_preferences(
        conn: &mut SqliteConnection,
        user_id: UserId,
        changes: &PreferencesChangeset<'_>,
    ) -> Result<Option<UserProfile>, diesel::result::Error> {
        if !changes.is_empty() {
            diesel::update(users::table.find(user_id))
                .set(changes)
                .execute(conn)?;
        }
        Self::find_by_id(conn, user_id)
    }

    /// Active users with notifications on whose last dispatch is older than
    /// `sent_before`, or who never received one.
    pub fn due_for_dispatch(
        conn: &mut SqliteConnection,
        sent_before: NaiveDateTime,
    ) -> Result<Vec<UserProfile>, diesel::result::Error> {
        users::table
            .filter(users::is_active.eq(true))
            .filter(users::notifications_enabled.eq(true))
            .filter(
                users::last_daily_words_sent
                    .is_null()
                    .or(users::last_daily_words_sent.lt(sent_before)),
            )
            .order_by(users::id.asc())
            .select(UserProfile::as_select())
            .load(conn)
    }

    pub fn mark_dispatched(
        conn: &mut SqliteConnection,
        user_id: UserId,
        at: NaiveDateTime,
    ) -> Result<(), diesel::result::Error> {
        diesel::update(users::table.find(user_id))
            .set(users::last_daily_words_sent.eq(Some(at)))
            .execute(conn)?;
        Ok(())
    }

    pub fn record_activity(
        conn: &mut SqliteConnection,
        user_id: UserId,
        learning_streak: i32,
        words_learned: i32,
        at: NaiveDateTime,
    ) -> Result<usize, diesel::result::Error> {
        diesel::update(users::table.find(user_id))
            .set((
                users::learning_streak.eq(learning_streak),
                users::total_words_learned.eq(users::total_words_learned + words_learned),
                users::last_activity.eq(Some(at)),
            ))
            .execute(conn)
    }

    /// Zeroes the streak of active users idle since before `idle_since`.
    pub fn reset_idle_streaks(
        conn: &mut SqliteConnection,
        idle_since: NaiveDateTime,
    ) -> Result<usize, diesel::result::Error> {
        diesel::update(
            users::table
                .filter(users::is_active.eq(true))
                .filter(users::learning_streak.gt(0))
                .filter(users::last_activity.lt(idle_since)),
        )
        .set(users::learning_streak.eq(0))
        .execute(conn)
    }
}
