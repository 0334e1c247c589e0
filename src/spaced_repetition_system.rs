// spaced_repetition_system.rs
use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use crate::data::models::{
    LearningStatus, ProgressRecord, ReviewOutcome, SrsError, INITIAL_EASE_FACTOR,
    MAX_EASE_FACTOR, MIN_EASE_FACTOR,
};

const EASE_BONUS: f64 = 0.1;
const EASE_PENALTY: f64 = 0.2;
const RESPONSE_TIME_SMOOTHING: f64 = 0.8;
const FAILED_RETRY_HOURS: i64 = 4;
/// Intervals stop growing at a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const MASTERY_ACCURACY: f64 = 0.9;
const MASTERY_LEVEL: u32 = 5;
const MASTERY_STREAK: u32 = 3;
const DEMOTION_STREAK: u32 = 2;
const FAILURE_MIN_REVIEWS: u32 = 5;
const FAILURE_ACCURACY: f64 = 0.3;
const FAILURE_STREAK: u32 = 3;

/// The SRS state machine. Every operation takes a record by reference and
/// returns the next record, leaving persistence to the caller.
pub struct SrsEngine;

impl SrsEngine {
    /// Applies one review outcome and reschedules the word.
    pub fn record_review(
        record: &ProgressRecord,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, SrsError> {
        outcome.validate()?;
        if let Some(seconds) = outcome.response_time {
            if !seconds.is_finite() {
                return Err(SrsError::InvalidArgument(
                    "Response time must be a finite number".into(),
                ));
            }
        }

        let mut next = record.clone();
        next.total_reviews += 1;
        next.last_reviewed_at = Some(now);

        if outcome.is_correct {
            next.correct_reviews += 1;
            next.consecutive_correct += 1;
            next.consecutive_incorrect = 0;
            next.first_correct_at.get_or_insert(now);
            Self::apply_success(&mut next);
        } else {
            next.consecutive_incorrect += 1;
            next.consecutive_correct = 0;
            Self::apply_failure(&mut next);
        }

        next.accuracy_rate = Some(next.correct_reviews as f64 / next.total_reviews as f64);

        if let Some(seconds) = outcome.response_time {
            next.average_response_time = Some(match next.average_response_time {
                Some(avg) => {
                    RESPONSE_TIME_SMOOTHING * avg + (1.0 - RESPONSE_TIME_SMOOTHING) * seconds
                }
                None => seconds,
            });
        }

        if let Some(rating) = outcome.difficulty_rating {
            next.difficulty_rating = Some(u8::try_from(rating).map_err(|_| {
                SrsError::InvalidArgument(format!("Difficulty rating out of range: {}", rating))
            })?);
        }

        Self::update_status(&mut next, now);
        next.next_review_at = Self::schedule(&next, now);

        Ok(next)
    }

    pub fn is_due(record: &ProgressRecord, now: DateTime<Utc>) -> bool {
        now >= record.next_review_at
    }

    /// Whole days left before the word is due, never negative.
    pub fn days_until_review(record: &ProgressRecord, now: DateTime<Utc>) -> i64 {
        (record.next_review_at - now).num_days().max(0)
    }

    /// Puts the word back at the start of the schedule. Review history,
    /// milestones and user annotations are kept.
    pub fn reset(record: &ProgressRecord, now: DateTime<Utc>) -> ProgressRecord {
        ProgressRecord {
            status: LearningStatus::New,
            srs_level: 0,
            srs_interval: 1,
            ease_factor: INITIAL_EASE_FACTOR,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            next_review_at: now,
            ..record.clone()
        }
    }

    /// Schedule reset that also erases review history and milestones.
    /// Favorite, flag and notes survive.
    pub fn full_reset(record: &ProgressRecord, now: DateTime<Utc>) -> ProgressRecord {
        ProgressRecord {
            total_reviews: 0,
            correct_reviews: 0,
            accuracy_rate: None,
            average_response_time: None,
            difficulty_rating: None,
            first_correct_at: None,
            mastered_at: None,
            last_reviewed_at: None,
            ..Self::reset(record, now)
        }
    }

    fn apply_success(record: &mut ProgressRecord) {
        match record.srs_level {
            0 => {
                record.srs_level = 1;
                record.srs_interval = 1;
            }
            1 => {
                record.srs_level = 2;
                record.srs_interval = 6;
            }
            _ => {
                record.srs_level += 1;
                let grown = (record.srs_interval as f64 * record.ease_factor).floor();
                record.srs_interval = (grown as u32).clamp(1, MAX_INTERVAL_DAYS);
            }
        }

        if record.consecutive_correct >= 2 {
            record.ease_factor = (record.ease_factor + EASE_BONUS).min(MAX_EASE_FACTOR);
        }
    }

    fn apply_failure(record: &mut ProgressRecord) {
        record.srs_level = record.srs_level.saturating_sub(1);
        record.srs_interval = 1;

        if record.consecutive_incorrect >= 2 {
            record.ease_factor = (record.ease_factor - EASE_PENALTY).max(MIN_EASE_FACTOR);
        }
    }

    // New -> learning may be overridden by mastery in the same call; after
    // that the first matching rule wins.
    fn update_status(record: &mut ProgressRecord, now: DateTime<Utc>) {
        if record.status == LearningStatus::New && record.total_reviews > 0 {
            record.status = LearningStatus::Learning;
        }

        let accuracy = record.accuracy_rate.unwrap_or(0.0);

        if accuracy >= MASTERY_ACCURACY
            && record.srs_level >= MASTERY_LEVEL
            && record.consecutive_correct >= MASTERY_STREAK
        {
            record.status = LearningStatus::Mastered;
            record.mastered_at.get_or_insert(now);
        } else if record.status == LearningStatus::Mastered
            && record.consecutive_incorrect >= DEMOTION_STREAK
        {
            record.status = LearningStatus::Review;
        } else if record.total_reviews >= FAILURE_MIN_REVIEWS
            && accuracy < FAILURE_ACCURACY
            && record.consecutive_incorrect >= FAILURE_STREAK
        {
            record.status = LearningStatus::Failed;
        }
    }

    fn schedule(record: &ProgressRecord, now: DateTime<Utc>) -> DateTime<Utc> {
        match record.status {
            LearningStatus::Mastered => now + Duration::days(2 * i64::from(record.srs_interval)),
            LearningStatus::Failed => now + Duration::hours(FAILED_RETRY_HOURS),
            _ => now + Duration::days(i64::from(record.srs_interval)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn fresh() -> ProgressRecord {
        ProgressRecord::new(1, 7, 42, now())
    }

    #[test]
    fn first_correct_review_moves_to_learning() {
        let next = SrsEngine::record_review(&fresh(), &ReviewOutcome::correct(), now()).unwrap();

        assert_eq!(next.srs_level, 1);
        assert_eq!(next.srs_interval, 1);
        assert_eq!(next.status, LearningStatus::Learning);
        assert_eq!(next.total_reviews, 1);
        assert_eq!(next.correct_reviews, 1);
        assert_eq!(next.first_correct_at, Some(now()));
        assert_eq!(next.last_reviewed_at, Some(now()));
        assert_eq!(next.accuracy_rate, Some(1.0));
        assert_eq!(next.next_review_at, now() + Duration::days(1));
    }

    #[test]
    fn level_one_success_jumps_to_six_days() {
        let record = ProgressRecord {
            srs_level: 1,
            status: LearningStatus::Learning,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();

        assert_eq!(next.srs_level, 2);
        assert_eq!(next.srs_interval, 6);
    }

    #[test]
    fn later_success_multiplies_by_ease() {
        let record = ProgressRecord {
            srs_level: 3,
            srs_interval: 10,
            ease_factor: 2.5,
            status: LearningStatus::Learning,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();

        assert_eq!(next.srs_level, 4);
        assert_eq!(next.srs_interval, 25);
        // streak of one does not earn an ease bonus
        assert_eq!(next.ease_factor, 2.5);
    }

    #[test]
    fn second_consecutive_success_raises_ease() {
        let record = ProgressRecord {
            srs_level: 2,
            srs_interval: 6,
            consecutive_correct: 1,
            status: LearningStatus::Learning,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();

        assert!((next.ease_factor - 2.6).abs() < 1e-9);
        assert_eq!(next.srs_interval, 15);
    }

    #[test]
    fn ease_bonus_is_capped() {
        let record = ProgressRecord {
            srs_level: 2,
            srs_interval: 6,
            ease_factor: 2.95,
            consecutive_correct: 4,
            status: LearningStatus::Learning,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();
        assert_eq!(next.ease_factor, MAX_EASE_FACTOR);
    }

    #[test]
    fn second_consecutive_failure_lowers_ease_and_level() {
        let record = ProgressRecord {
            srs_level: 3,
            srs_interval: 15,
            consecutive_incorrect: 1,
            total_reviews: 4,
            correct_reviews: 3,
            status: LearningStatus::Learning,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::incorrect(), now()).unwrap();

        assert_eq!(next.consecutive_incorrect, 2);
        assert_eq!(next.consecutive_correct, 0);
        assert!((next.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(next.srs_interval, 1);
        assert_eq!(next.srs_level, 2);
        assert_eq!(next.next_review_at, now() + Duration::days(1));
    }

    #[test]
    fn failure_at_level_zero_stays_at_zero() {
        let record = ProgressRecord {
            consecutive_incorrect: 1,
            ease_factor: 1.4,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::incorrect(), now()).unwrap();

        assert_eq!(next.srs_level, 0);
        assert_eq!(next.ease_factor, MIN_EASE_FACTOR);
        assert!(next.first_correct_at.is_none());
    }

    #[test]
    fn mastery_is_reached_and_scheduled_at_double_interval() {
        // 18 of 19 correct, third success in a row lifts the word to level 5
        let record = ProgressRecord {
            srs_level: 4,
            srs_interval: 20,
            ease_factor: 2.5,
            total_reviews: 19,
            correct_reviews: 18,
            consecutive_correct: 2,
            status: LearningStatus::Learning,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();

        assert_eq!(next.accuracy_rate, Some(0.95));
        assert_eq!(next.srs_level, 5);
        assert_eq!(next.consecutive_correct, 3);
        assert_eq!(next.status, LearningStatus::Mastered);
        assert_eq!(next.mastered_at, Some(now()));
        assert_eq!(
            next.next_review_at,
            now() + Duration::days(2 * i64::from(next.srs_interval))
        );
    }

    #[test]
    fn mastery_overrides_new_to_learning_in_one_call() {
        let record = ProgressRecord {
            srs_level: 4,
            srs_interval: 20,
            consecutive_correct: 2,
            status: LearningStatus::New,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();
        assert_eq!(next.status, LearningStatus::Mastered);
    }

    #[test]
    fn mastered_at_is_kept_on_later_mastery() {
        let earlier = now() - Duration::days(30);
        let record = ProgressRecord {
            srs_level: 6,
            srs_interval: 40,
            total_reviews: 10,
            correct_reviews: 10,
            consecutive_correct: 10,
            status: LearningStatus::Mastered,
            mastered_at: Some(earlier),
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();
        assert_eq!(next.mastered_at, Some(earlier));
    }

    #[test]
    fn mastered_word_is_demoted_after_two_misses() {
        let record = ProgressRecord {
            srs_level: 6,
            srs_interval: 40,
            total_reviews: 20,
            correct_reviews: 19,
            consecutive_incorrect: 1,
            status: LearningStatus::Mastered,
            mastered_at: Some(now()),
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::incorrect(), now()).unwrap();

        assert_eq!(next.status, LearningStatus::Review);
        assert_eq!(next.mastered_at, Some(now()));
        assert_eq!(next.next_review_at, now() + Duration::days(1));
    }

    #[test]
    fn persistent_misses_mark_the_word_failed() {
        let mut record = fresh();
        for _ in 0..5 {
            record = SrsEngine::record_review(&record, &ReviewOutcome::incorrect(), now()).unwrap();
        }

        assert_eq!(record.accuracy_rate, Some(0.0));
        assert_eq!(record.status, LearningStatus::Failed);
        assert_eq!(record.next_review_at, now() + Duration::hours(4));
    }

    #[test]
    fn response_time_uses_moving_average() {
        let first = SrsEngine::record_review(
            &fresh(),
            &ReviewOutcome::correct().with_response_time(10.0),
            now(),
        )
        .unwrap();
        assert_eq!(first.average_response_time, Some(10.0));

        let second = SrsEngine::record_review(
            &first,
            &ReviewOutcome::correct().with_response_time(5.0).with_difficulty(2),
            now(),
        )
        .unwrap();
        assert!((second.average_response_time.unwrap() - 9.0).abs() < 1e-9);
        assert_eq!(second.difficulty_rating, Some(2));
    }

    #[test]
    fn invalid_outcome_is_rejected() {
        let record = fresh();
        let negative = ReviewOutcome::correct().with_response_time(-1.0);
        assert!(matches!(
            SrsEngine::record_review(&record, &negative, now()),
            Err(SrsError::InvalidArgument(_))
        ));

        let nan = ReviewOutcome::correct().with_response_time(f64::NAN);
        assert!(matches!(
            SrsEngine::record_review(&record, &nan, now()),
            Err(SrsError::InvalidArgument(_))
        ));

        let rating = ReviewOutcome::incorrect().with_difficulty(6);
        assert!(matches!(
            SrsEngine::record_review(&record, &rating, now()),
            Err(SrsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn due_check_is_inclusive() {
        let record = fresh();
        assert!(SrsEngine::is_due(&record, now()));
        assert!(!SrsEngine::is_due(&record, now() - Duration::seconds(1)));
        assert_eq!(SrsEngine::days_until_review(&record, now() - Duration::days(3)), 3);
        assert_eq!(SrsEngine::days_until_review(&record, now() + Duration::days(3)), 0);
    }

    #[test]
    fn reset_keeps_history_full_reset_clears_it() {
        let mut record = fresh();
        for _ in 0..3 {
            record = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();
        }
        record.is_favorite = true;
        record.notes = Some("tricky".into());
        record.mastered_at = Some(now());
        let later = now() + Duration::days(2);

        let reset = SrsEngine::reset(&record, later);
        assert_eq!(reset.status, LearningStatus::New);
        assert_eq!(reset.srs_level, 0);
        assert_eq!(reset.srs_interval, 1);
        assert_eq!(reset.ease_factor, INITIAL_EASE_FACTOR);
        assert_eq!(reset.consecutive_correct, 0);
        assert_eq!(reset.next_review_at, later);
        assert_eq!(reset.total_reviews, 3);
        assert_eq!(reset.correct_reviews, 3);
        assert_eq!(reset.mastered_at, Some(now()));
        assert!(reset.first_correct_at.is_some());
        assert!(reset.is_favorite);

        let erased = SrsEngine::full_reset(&record, later);
        assert_eq!(erased.total_reviews, 0);
        assert_eq!(erased.correct_reviews, 0);
        assert_eq!(erased.accuracy_rate, None);
        assert_eq!(erased.mastered_at, None);
        assert_eq!(erased.first_correct_at, None);
        assert_eq!(erased.notes.as_deref(), Some("tricky"));
        assert!(erased.is_favorite);
    }

    #[test]
    fn correct_streak_never_shrinks_interval_past_level_one() {
        let mut record = fresh();
        let mut previous = 0;
        for step in 0..12 {
            record = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();
            if step >= 2 {
                assert!(record.srs_interval >= previous);
            }
            previous = record.srs_interval;
        }
    }

    #[test]
    fn interval_growth_is_capped() {
        let record = ProgressRecord {
            srs_level: 9,
            srs_interval: 30_000,
            ease_factor: 3.0,
            status: LearningStatus::Learning,
            ..fresh()
        };
        let next = SrsEngine::record_review(&record, &ReviewOutcome::correct(), now()).unwrap();
        assert_eq!(next.srs_interval, MAX_INTERVAL_DAYS);
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_review_sequence(
            outcomes in proptest::collection::vec(
                (any::<bool>(), proptest::option::of(0.0f64..120.0), proptest::option::of(1i32..=5)),
                1..60,
            )
        ) {
            let mut record = fresh();
            for (is_correct, response_time, difficulty_rating) in outcomes {
                let outcome = ReviewOutcome { is_correct, response_time, difficulty_rating };
                record = SrsEngine::record_review(&record, &outcome, now()).unwrap();

                prop_assert!(record.srs_interval >= 1);
                prop_assert!(record.ease_factor >= MIN_EASE_FACTOR);
                prop_assert!(record.ease_factor <= MAX_EASE_FACTOR);
                let accuracy = record.accuracy_rate.unwrap();
                prop_assert!((0.0..=1.0).contains(&accuracy));
                prop_assert_eq!(
                    accuracy,
                    record.correct_reviews as f64 / record.total_reviews as f64
                );
                prop_assert!(record.next_review_at > now());
            }
        }
    }
}
