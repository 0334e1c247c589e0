use diesel::prelude::*;

use crate::data::models::{Example, NewExample, WordId};
use crate::schema::examples;

pub struct ExampleRepository;

impl ExampleRepository {
    /// Verified sentences first, then the least used.
    pub fn by_word(
        conn: &mut SqliteConnection,
        word_id: WordId,
    ) -> Result<Vec<Example>, diesel::result::Error> {
        examples::table
            .filter(examples::word_id.eq(word_id))
            .order_by((
                examples::is_verified.desc(),
                examples::usage_count.asc(),
                examples::id.asc(),
            ))
            .select(Example::as_select())
            .load(conn)
    }

    pub fn insert_all(
        conn: &mut SqliteConnection,
        new_examples: &[NewExample<'_>],
    ) -> Result<usize, diesel::result::Error> {
        if new_examples.is_empty() {
            return Ok(0);
        }

        diesel::insert_into(examples::table)
            .values(new_examples)
            .execute(conn)
    }
}
