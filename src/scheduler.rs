use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::Settings;
use crate::data::models::SrsError;
use crate::data::repositories::{ProgressStore, UserRepository};
use crate::features::learning::{ActivityTracker, SessionPlanner};
use crate::features::vocabulary::WordSupply;
use crate::DbPool;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    pub planned: usize,
    pub skipped_empty: usize,
    pub errors: usize,
    pub streaks_reset: usize,
}

/// Periodically plans the daily session of every user who is due one.
pub struct DailyDispatcher<S, W> {
    pool: DbPool,
    planner: Arc<SessionPlanner<S, W>>,
    activity: ActivityTracker,
    settings: Settings,
}

impl<S: ProgressStore, W: WordSupply> DailyDispatcher<S, W> {
    pub fn new(pool: DbPool, planner: Arc<SessionPlanner<S, W>>, settings: Settings) -> Self {
        Self {
            activity: ActivityTracker::new(pool.clone()),
            pool,
            planner,
            settings,
        }
    }

    /// One pass over eligible users, after zeroing idle streaks. A failure
    /// for one user is logged and counted; only failing to list users aborts
    /// the pass.
    pub fn run_once(&self, now: DateTime<Utc>) -> Result<DispatchReport, SrsError> {
        let mut report = DispatchReport::default();

        match self.activity.reset_inactive_streaks(now) {
            Ok(count) => report.streaks_reset = count,
            Err(e) => log::error!("Failed to reset inactive streaks: {}", e),
        }

        let cutoff = now - Duration::hours(self.settings.dispatch_cooldown_hours);
        let users = {
            let mut conn = self.pool.get()?;
            UserRepository::due_for_dispatch(&mut conn, cutoff.naive_utc())?
        };

        for profile in users {
            let session = match self
                .planner
                .plan_daily_session(&profile, profile.daily_word_count, now)
            {
                Ok(session) => session,
                Err(e) => {
                    report.errors += 1;
                    log::error!("Failed to plan session for user {}: {}", profile.id, e);
                    continue;
                }
            };

            if session.is_empty() {
                report.skipped_empty += 1;
                log::info!("No words to send to user {}", profile.id);
                continue;
            }

            let stamped = self
                .pool
                .get()
                .map_err(SrsError::from)
                .and_then(|mut conn| {
                    UserRepository::mark_dispatched(&mut conn, profile.id, now.naive_utc())
                        .map_err(SrsError::from)
                });

            match stamped {
                Ok(()) => {
                    report.planned += 1;
                    log::info!(
                        "Daily words ready for user {}: {} words{}",
                        profile.id,
                        session.total_count,
                        if session.partial { " (partial)" } else { "" }
                    );
                }
                Err(e) => {
                    report.errors += 1;
                    log::error!("Failed to stamp dispatch for user {}: {}", profile.id, e);
                }
            }
        }

        Ok(report)
    }
}

impl<S, W> DailyDispatcher<S, W>
where
    S: ProgressStore + 'static,
    W: WordSupply + 'static,
{
    /// Runs `run_once` on a fixed interval until the runtime shuts down.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let period = StdDuration::from_secs(self.settings.dispatch_interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;

                let dispatcher = Arc::clone(&self);
                match tokio::task::spawn_blocking(move || dispatcher.run_once(Utc::now())).await {
                    Ok(Ok(report)) => log::info!(
                        "Daily dispatch finished: {} planned, {} empty, {} errors, {} streaks reset",
                        report.planned,
                        report.skipped_empty,
                        report.errors,
                        report.streaks_reset
                    ),
                    Ok(Err(e)) => log::error!("Daily dispatch failed: {}", e),
                    Err(e) => log::error!("Daily dispatch task aborted: {}", e),
                }
            }
        })
    }
}
