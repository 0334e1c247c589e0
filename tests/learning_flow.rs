mod common;

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;

use vocala::config::Settings;
use vocala::data::models::{
    GeneratedExample, GeneratedWord, LearningStatus, ReviewOutcome, SrsError, UserProfile, Word,
};
use vocala::data::repositories::{DieselProgressStore, ExampleRepository, ProgressStore};
use vocala::features::learning::{ActivityTracker, LearningService, SessionPlanner};
use vocala::features::vocabulary::{CatalogWordSupply, SupplyError, WordGenerator};
use vocala::schema::words;

struct StaticGenerator(Vec<GeneratedWord>);

impl WordGenerator for StaticGenerator {
    fn generate(&self, _profile: &UserProfile, count: usize) -> Result<Vec<GeneratedWord>, SupplyError> {
        Ok(self.0.iter().take(count).cloned().collect())
    }
}

struct BrokenGenerator;

impl WordGenerator for BrokenGenerator {
    fn generate(&self, _profile: &UserProfile, _count: usize) -> Result<Vec<GeneratedWord>, SupplyError> {
        Err(SupplyError::Generator("quota exceeded".into()))
    }
}

fn generated(english: &str) -> GeneratedWord {
    GeneratedWord {
        english_word: english.into(),
        turkish_translation: "dayanıklı".into(),
        part_of_speech: "adjective".into(),
        definition: Some("able to recover quickly".into()),
        examples: vec![
            GeneratedExample {
                english_sentence: format!("{} is the word of the day.", english.trim()),
                turkish_translation: "Günün kelimesi.".into(),
            },
            GeneratedExample {
                english_sentence: "   ".into(),
                turkish_translation: "".into(),
            },
        ],
    }
}

fn load_words(db: &common::TestDb) -> Vec<Word> {
    let mut conn = db.pool.get().unwrap();
    words::table
        .order_by(words::id.asc())
        .select(Word::as_select())
        .load(&mut conn)
        .unwrap()
}

#[test]
fn review_is_scored_and_persisted() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 5, "B1_B2");
    let word = common::seed_word(&db.pool, "abandon", "B1_B2", true);
    let store = DieselProgressStore::new(db.pool.clone());
    store.create(user.id, word, Utc::now()).unwrap();
    let service = LearningService::new(store, db.settings.clone());

    let now = Utc::now();
    let updated = service
        .record_word_review(user.id, word, &ReviewOutcome::correct().with_response_time(2.0), now)
        .unwrap();

    assert_eq!(updated.srs_level, 1);
    assert_eq!(updated.status, LearningStatus::Learning);

    let stored = service.store().find(user.id, word).unwrap().unwrap();
    assert_eq!(stored.total_reviews, 1);
    assert_eq!(stored.correct_reviews, 1);
    assert_eq!(stored.accuracy_rate, Some(1.0));
    assert_eq!(stored.average_response_time, Some(2.0));
    assert_eq!(stored.version, 1);
    assert!(stored.next_review_at > now);
}

#[test]
fn rejected_review_leaves_the_row_alone() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 5, "B1_B2");
    let word = common::seed_word(&db.pool, "abandon", "B1_B2", true);
    let store = DieselProgressStore::new(db.pool.clone());
    store.create(user.id, word, Utc::now()).unwrap();
    let service = LearningService::new(store, db.settings.clone());

    let err = service
        .record_word_review(user.id, word, &ReviewOutcome::incorrect().with_response_time(-1.0), Utc::now())
        .unwrap_err();

    assert!(matches!(err, SrsError::InvalidArgument(_)));
    let stored = service.store().find(user.id, word).unwrap().unwrap();
    assert_eq!(stored.total_reviews, 0);
    assert_eq!(stored.version, 0);
}

#[test]
fn review_of_unassigned_word_is_not_found() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 5, "B1_B2");
    let service = LearningService::new(DieselProgressStore::new(db.pool.clone()), db.settings.clone());

    let err = service
        .record_word_review(user.id, 42, &ReviewOutcome::correct(), Utc::now())
        .unwrap_err();

    assert!(matches!(err, SrsError::NotFound { word_id: 42, .. }));
}

#[test]
fn concurrent_reviews_are_all_counted() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 5, "B1_B2");
    let word = common::seed_word(&db.pool, "abandon", "B1_B2", true);
    let store = DieselProgressStore::new(db.pool.clone());
    store.create(user.id, word, Utc::now()).unwrap();

    let settings = Settings {
        review_retry_limit: 10,
        ..db.settings.clone()
    };
    let service = Arc::new(LearningService::new(store, settings));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service
                    .record_word_review(user.id, word, &ReviewOutcome::correct(), Utc::now())
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = service.store().find(user.id, word).unwrap().unwrap();
    assert_eq!(stored.total_reviews, 4);
    assert_eq!(stored.correct_reviews, 4);
    assert_eq!(stored.version, 4);
}

#[test]
fn statistics_reflect_stored_progress() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 5, "B1_B2");
    let store = DieselProgressStore::new(db.pool.clone());
    let words: Vec<_> = ["abandon", "brave", "calm"]
        .into_iter()
        .map(|english| {
            let word = common::seed_word(&db.pool, english, "B1_B2", true);
            store.create(user.id, word, Utc::now()).unwrap();
            word
        })
        .collect();
    let service = LearningService::new(store, db.settings.clone());

    let now = Utc::now();
    service.record_word_review(user.id, words[0], &ReviewOutcome::correct(), now).unwrap();
    service.record_word_review(user.id, words[1], &ReviewOutcome::incorrect(), now).unwrap();
    service.set_favorite(user.id, words[1], true).unwrap();

    let stats = service.statistics(user.id, now).unwrap();
    assert_eq!(stats.total_words, 3);
    assert_eq!(stats.total_reviews, 2);
    assert_eq!(stats.total_correct, 1);
    assert_eq!(stats.overall_accuracy, 0.5);
    assert_eq!(stats.learning_words, 2);
    assert_eq!(stats.new_words, 1);
    assert_eq!(stats.status_breakdown["learning"], 2);
    assert_eq!(stats.favorite_words, 1);
    // Only the untouched word is still due.
    assert_eq!(stats.words_due_for_review, 1);
}

#[test]
fn planner_assigns_verified_words_of_the_users_level() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 3, "B1_B2");
    let wanted = [
        common::seed_word(&db.pool, "abandon", "B1_B2", true),
        common::seed_word(&db.pool, "brave", "B1_B2", true),
    ];
    common::seed_word(&db.pool, "draft", "B1_B2", false);
    common::seed_word(&db.pool, "ubiquitous", "C1_C2", true);

    let store = DieselProgressStore::new(db.pool.clone());
    let planner = SessionPlanner::new(store.clone(), CatalogWordSupply::new(db.pool.clone()));

    let session = planner.plan_daily_session(&user, 3, Utc::now()).unwrap();

    let mut assigned: Vec<_> = session.new_records.iter().map(|r| r.word_id).collect();
    assigned.sort();
    assert_eq!(assigned, wanted.to_vec());
    assert!(session.review_records.is_empty());
    assert!(session.partial);
    assert_eq!(store.word_ids(user.id).unwrap().len(), 2);

    for word in load_words(&db) {
        let served = wanted.contains(&word.id);
        assert_eq!(word.usage_count, i32::from(served));
        assert_eq!(word.last_used_at.is_some(), served);
    }
}

#[test]
fn planner_tops_up_from_the_generator() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 3, "B1_B2");
    let cached = common::seed_word(&db.pool, "abandon", "B1_B2", true);

    let generator = StaticGenerator(vec![
        generated("Abandon!"),
        generated("Resilient"),
        generated("  "),
        generated("thorough"),
    ]);
    let supply = CatalogWordSupply::new(db.pool.clone()).with_generator(Arc::new(generator));
    let planner = SessionPlanner::new(DieselProgressStore::new(db.pool.clone()), supply);

    let session = planner.plan_daily_session(&user, 3, Utc::now()).unwrap();

    assert_eq!(session.new_records.len(), 2);
    assert_eq!(session.new_records[0].word_id, cached);
    assert!(session.partial);

    let words = load_words(&db);
    assert_eq!(words.len(), 2);
    assert_eq!(words[1].english_word, "Resilient");
    assert_eq!(words[1].normalized_word, "resilient");
    assert!(!words[1].is_verified);
    assert_eq!(words[1].difficulty_level, "B1_B2");

    let mut conn = db.pool.get().unwrap();
    let examples = ExampleRepository::by_word(&mut conn, words[1].id).unwrap();
    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].english_sentence, "Resilient is the word of the day.");
    assert_eq!(examples[0].difficulty_level, "B1_B2");
    assert!(ExampleRepository::by_word(&mut conn, cached).unwrap().is_empty());
}

#[test]
fn new_records_are_stamped_with_the_planning_time() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 1, "B1_B2");
    common::seed_word(&db.pool, "abandon", "B1_B2", true);
    let planner = SessionPlanner::new(
        DieselProgressStore::new(db.pool.clone()),
        CatalogWordSupply::new(db.pool.clone()),
    );
    let planned_at = Utc.with_ymd_and_hms(2026, 1, 5, 7, 30, 0).unwrap();

    let session = planner.plan_daily_session(&user, 1, planned_at).unwrap();

    let record = &session.new_records[0];
    assert_eq!(record.first_seen_at, planned_at);
    assert_eq!(record.next_review_at, planned_at);
    assert_eq!(record.created_at, planned_at);
}

#[test]
fn generated_words_are_cached_while_another_writer_holds_the_lock() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 1, "B1_B2");
    let supply = CatalogWordSupply::new(db.pool.clone())
        .with_generator(Arc::new(StaticGenerator(vec![generated("resilient")])));
    let planner = SessionPlanner::new(DieselProgressStore::new(db.pool.clone()), supply);

    let (locked_tx, locked_rx) = mpsc::channel();
    let pool = db.pool.clone();
    let user_id = user.id;
    let writer = thread::spawn(move || {
        let mut conn = pool.get().unwrap();
        conn.batch_execute(&format!(
            "BEGIN IMMEDIATE; UPDATE users SET daily_word_count = 2 WHERE id = {};",
            user_id
        ))
        .unwrap();
        locked_tx.send(()).unwrap();
        thread::sleep(StdDuration::from_millis(500));
        conn.batch_execute("COMMIT").unwrap();
    });

    locked_rx.recv().unwrap();
    let session = planner.plan_daily_session(&user, 1, Utc::now()).unwrap();
    writer.join().unwrap();

    assert_eq!(session.new_records.len(), 1);
    assert_eq!(session.failed_assignments, 0);
    let words = load_words(&db);
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].english_word, "resilient");
}

#[test]
fn generator_failure_still_serves_cached_words() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 4, "B1_B2");
    common::seed_word(&db.pool, "abandon", "B1_B2", true);

    let supply = CatalogWordSupply::new(db.pool.clone()).with_generator(Arc::new(BrokenGenerator));
    let planner = SessionPlanner::new(DieselProgressStore::new(db.pool.clone()), supply);

    let session = planner.plan_daily_session(&user, 4, Utc::now()).unwrap();

    assert_eq!(session.new_records.len(), 1);
    assert_eq!(session.requested_new, 4);
    assert!(session.partial);
}

#[test]
fn second_session_prefers_due_reviews() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 2, "B1_B2");
    for english in ["abandon", "brave", "calm"] {
        common::seed_word(&db.pool, english, "B1_B2", true);
    }
    let planner = SessionPlanner::new(
        DieselProgressStore::new(db.pool.clone()),
        CatalogWordSupply::new(db.pool.clone()),
    );

    let first = planner.plan_daily_session(&user, 2, Utc::now()).unwrap();
    assert_eq!(first.new_records.len(), 2);

    let second = planner.plan_daily_session(&user, 2, Utc::now()).unwrap();
    assert_eq!(second.review_records.len(), 2);
    assert!(second.new_records.is_empty());
    assert!(!second.partial);
}

#[test]
fn streak_follows_review_days() {
    let db = common::setup();
    let user = common::seed_user(&db.pool, 5, "B1_B2");
    let tracker = ActivityTracker::new(db.pool.clone());
    let day_one = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

    let profile = tracker.record_review(user.id, false, day_one).unwrap();
    assert_eq!(profile.learning_streak, 1);

    let profile = tracker
        .record_review(user.id, true, day_one + chrono::Duration::hours(25))
        .unwrap();
    assert_eq!(profile.learning_streak, 2);
    assert_eq!(profile.total_words_learned, 1);

    let profile = tracker
        .record_review(user.id, false, day_one + chrono::Duration::hours(26))
        .unwrap();
    assert_eq!(profile.learning_streak, 2);

    let profile = tracker
        .record_review(user.id, false, day_one + chrono::Duration::days(4))
        .unwrap();
    assert_eq!(profile.learning_streak, 1);
    assert_eq!(profile.total_words_learned, 1);

    assert!(matches!(
        tracker.record_review(999, false, day_one),
        Err(SrsError::UserNotFound(999))
    ));
}
