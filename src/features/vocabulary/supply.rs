use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use thiserror::Error;

use crate::data::models::{GeneratedWord, NewExample, NewWord, UserProfile, Word, WordId};
use crate::data::repositories::{ExampleRepository, WordRepository};
use crate::features::vocabulary::normalize_word;
use crate::DbPool;

#[derive(Error, Debug)]
pub enum SupplyError {
    #[error("Word catalog unavailable: {0}")]
    Unavailable(String),
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Generator error: {0}")]
    Generator(String),
}

impl From<r2d2::Error> for SupplyError {
    fn from(err: r2d2::Error) -> Self {
        SupplyError::Unavailable(err.to_string())
    }
}

/// Source of words a user has not seen yet.
pub trait WordSupply: Send + Sync {
    /// May return fewer than `count` ids.
    fn fetch_words(
        &self,
        profile: &UserProfile,
        count: usize,
        exclude: &HashSet<WordId>,
    ) -> Result<Vec<WordId>, SupplyError>;
}

impl<T: WordSupply + ?Sized> WordSupply for Arc<T> {
    fn fetch_words(
        &self,
        profile: &UserProfile,
        count: usize,
        exclude: &HashSet<WordId>,
    ) -> Result<Vec<WordId>, SupplyError> {
        (**self).fetch_words(profile, count, exclude)
    }
}

/// The generative text provider, treated as an opaque function.
pub trait WordGenerator: Send + Sync {
    fn generate(
        &self,
        profile: &UserProfile,
        count: usize,
    ) -> Result<Vec<GeneratedWord>, SupplyError>;
}

/// Serves cached words from the catalog and tops up from the generator.
#[derive(Clone)]
pub struct CatalogWordSupply {
    pool: DbPool,
    generator: Option<Arc<dyn WordGenerator>>,
}

impl CatalogWordSupply {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn WordGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    fn cache_generated(
        conn: &mut SqliteConnection,
        profile: &UserProfile,
        generated: &[GeneratedWord],
        taken: &mut HashSet<WordId>,
        needed: usize,
    ) -> Vec<WordId> {
        let mut ids = Vec::new();

        for entry in generated {
            if ids.len() >= needed {
                break;
            }

            let normalized = normalize_word(&entry.english_word);
            if normalized.is_empty() {
                log::warn!("Skipping generated word {:?}", entry.english_word);
                continue;
            }

            // A deferred read-then-write cannot wait out a concurrent writer.
            let cached = conn.immediate_transaction::<_, diesel::result::Error, _>(|conn| {
                match WordRepository::find_by_normalized(conn, &normalized)? {
                    Some(existing) => Ok(existing),
                    None => Self::insert_generated(conn, profile, entry, &normalized),
                }
            });

            match cached {
                Ok(word) if taken.insert(word.id) => ids.push(word.id),
                Ok(word) => log::debug!("Generated word {} already taken", word.english_word),
                Err(e) => log::error!("Failed to cache word {}: {}", entry.english_word, e),
            }
        }

        log::info!("Cached {} generated words", ids.len());
        ids
    }

    /// Examples are only stored alongside a newly cached word.
    fn insert_generated(
        conn: &mut SqliteConnection,
        profile: &UserProfile,
        entry: &GeneratedWord,
        normalized: &str,
    ) -> Result<Word, diesel::result::Error> {
        let now = Utc::now().naive_utc();
        let word = WordRepository::insert(
            conn,
            &NewWord {
                english_word: entry.english_word.trim(),
                normalized_word: normalized,
                turkish_translation: entry.turkish_translation.trim(),
                part_of_speech: entry.part_of_speech.trim(),
                definition: entry.definition.as_deref(),
                difficulty_level: &profile.difficulty_level,
                is_verified: false,
                usage_count: 0,
                created_at: now,
            },
        )?;

        let examples: Vec<NewExample<'_>> = entry
            .examples
            .iter()
            .filter(|example| !example.english_sentence.trim().is_empty())
            .map(|example| NewExample {
                word_id: word.id,
                english_sentence: example.english_sentence.trim(),
                turkish_translation: example.turkish_translation.trim(),
                difficulty_level: &profile.difficulty_level,
                is_verified: false,
                usage_count: 0,
                created_at: now,
            })
            .collect();
        ExampleRepository::insert_all(conn, &examples)?;

        Ok(word)
    }
}

impl WordSupply for CatalogWordSupply {
    fn fetch_words(
        &self,
        profile: &UserProfile,
        count: usize,
        exclude: &HashSet<WordId>,
    ) -> Result<Vec<WordId>, SupplyError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get()?;
        let exclude_ids: Vec<WordId> = exclude.iter().copied().collect();

        let mut ids: Vec<WordId> = WordRepository::verified_by_difficulty(
            &mut conn,
            &profile.difficulty_level,
            count,
            &exclude_ids,
        )?
        .into_iter()
        .map(|word| word.id)
        .collect();

        if ids.len() < count {
            let needed = count - ids.len();
            match &self.generator {
                Some(generator) => {
                    log::info!("Need to generate {} new words for user {}", needed, profile.id);
                    match generator.generate(profile, needed) {
                        Ok(generated) => {
                            let mut taken: HashSet<WordId> =
                                exclude.iter().chain(ids.iter()).copied().collect();
                            let fresh = Self::cache_generated(
                                &mut conn, profile, &generated, &mut taken, needed,
                            );
                            ids.extend(fresh);
                        }
                        Err(e) => log::error!("Failed to generate new words: {}", e),
                    }
                }
                None => log::warn!(
                    "Catalog has only {} of {} words for level {}",
                    ids.len(),
                    count,
                    profile.difficulty_level
                ),
            }
        }

        WordRepository::increment_usage(&mut conn, &ids, Utc::now().naive_utc())?;
        Ok(ids)
    }
}
