//! sqlx/MySQL implementation of every repository trait.
//!
//! Queries are checked at runtime (`query`/`query_as`), so the crate builds
//! without a live database. Schema lives in `migrations/`.

use sqlx::MySqlPool;

mod announcement;
mod asset;
mod attendance;
mod document;
mod evaluation;
mod goal;
mod leave_request;
mod message;
mod profile_picture;
mod refresh_token;
mod shift;
mod task;
mod user;

#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}
