use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::data::models::{SrsError, UserId, UserProfile};
use crate::data::repositories::UserRepository;
use crate::DbPool;

/// Users idle for longer than this lose their streak.
pub const STREAK_GRACE_HOURS: i64 = 48;

/// Keeps the per-user learning streak and learned-word total.
#[derive(Clone)]
pub struct ActivityTracker {
    pool: DbPool,
}

impl ActivityTracker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Counts one review at `now`. A newly mastered word also adds to the
    /// learned total.
    pub fn record_review(
        &self,
        user_id: UserId,
        newly_mastered: bool,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, SrsError> {
        let mut conn = self.pool.get()?;
        let profile =
            UserRepository::find_by_id(&mut conn, user_id)?.ok_or(SrsError::UserNotFound(user_id))?;

        let streak = next_streak(profile.learning_streak, profile.last_activity, now);
        UserRepository::record_activity(
            &mut conn,
            user_id,
            streak,
            i32::from(newly_mastered),
            now.naive_utc(),
        )?;

        if streak != profile.learning_streak {
            log::debug!("User {} streak is now {}", user_id, streak);
        }

        UserRepository::find_by_id(&mut conn, user_id)?.ok_or(SrsError::UserNotFound(user_id))
    }

    pub fn reset_inactive_streaks(&self, now: DateTime<Utc>) -> Result<usize, SrsError> {
        let mut conn = self.pool.get()?;
        let idle_since = now - Duration::hours(STREAK_GRACE_HOURS);
        let reset = UserRepository::reset_idle_streaks(&mut conn, idle_since.naive_utc())?;
        if reset > 0 {
            log::info!("Reset learning streak of {} inactive users", reset);
        }
        Ok(reset)
    }
}

/// Same UTC day keeps the streak, the following day extends it, anything
/// else starts over at one.
pub fn next_streak(current: i32, last_activity: Option<NaiveDateTime>, now: DateTime<Utc>) -> i32 {
    let today = now.date_naive();
    match last_activity.map(|at| at.date()) {
        Some(day) if day == today => current.max(1),
        Some(day) if day.succ_opt() == Some(today) => current.saturating_add(1),
        _ => 1,
    }
}
