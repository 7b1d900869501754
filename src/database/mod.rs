pub mod connection;
pub mod friendships;
pub mod matches;
pub mod models;
pub mod setup;
pub mod tournaments;
pub mod users;

use chrono::{NaiveDateTime, Utc};

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
pub use models::*;

/// Timestamp stored in every created_at / updated_at column
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
