pub mod config;
pub mod data;
pub mod features;
pub mod handlers;
pub mod scheduler;
pub mod schema;
pub mod spaced_repetition_system;

use diesel::{
    r2d2::{ConnectionManager, Pool},
    SqliteConnection,
};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
