//! Player record storage.
//!
//! Writes are conditional so the store, not the application, serializes
//! concurrent updates to the same record.

mod sqlite;

pub use sqlite::SqliteUserStore;

use async_trait::async_trait;

use crate::models::UserRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,
    #[error("Record changed concurrently")]
    Conflict,
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert the record unless one with the same id exists.
    /// Returns `true` when a new record was written.
    async fn create_user(&self, user: &UserRecord) -> Result<bool, StoreError>;

    /// Set a new prompt and stamp `updated`, but only while `updated` still
    /// equals `expected_updated`. Fails with `NotFound` when the record does
    /// not exist and `Conflict` when it changed underneath.
    async fn update_prompt(
        &self,
        id: &str,
        prompt: &str,
        expected_updated: i64,
        now_ms: i64,
    ) -> Result<(), StoreError>;

    /// Add `points`, clear the prompt and stamp `updated`, but only while
    /// `updated` still equals `expected_updated`. Returns the new total.
    async fn award_points(
        &self,
        id: &str,
        points: u64,
        expected_updated: i64,
        now_ms: i64,
    ) -> Result<u64, StoreError>;
}
