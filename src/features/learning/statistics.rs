use chrono::{DateTime, Utc};

use crate::data::models::{LearningStatistics, LearningStatus, ProgressRecord};
use crate::spaced_repetition_system::SrsEngine;

pub struct StatisticsReporter;

impl StatisticsReporter {
    /// Aggregates one user's records. Every status appears in the
    /// breakdown, with zero when the user has no word in it.
    pub fn summarize(records: &[ProgressRecord], now: DateTime<Utc>) -> LearningStatistics {
        let mut stats = LearningStatistics {
            total_words: records.len(),
            status_breakdown: LearningStatus::ALL
                .iter()
                .map(|status| (status.as_str().to_string(), 0))
                .collect(),
            ..LearningStatistics::default()
        };

        for record in records {
            *stats
                .status_breakdown
                .entry(record.status.as_str().to_string())
                .or_default() += 1;

            match record.status {
                LearningStatus::New => stats.new_words += 1,
                LearningStatus::Learning => stats.learning_words += 1,
                LearningStatus::Review => stats.review_words += 1,
                LearningStatus::Mastered => stats.mastered_words += 1,
                LearningStatus::Failed => stats.failed_words += 1,
            }

            stats.total_reviews += u64::from(record.total_reviews);
            stats.total_correct += u64::from(record.correct_reviews);

            if SrsEngine::is_due(record, now) {
                stats.words_due_for_review += 1;
            }
            if record.is_favorite {
                stats.favorite_words += 1;
            }
            if record.is_flagged {
                stats.flagged_words += 1;
            }
        }

        if stats.total_reviews > 0 {
            stats.overall_accuracy = stats.total_correct as f64 / stats.total_reviews as f64;
        }

        stats
    }
}
