//! Persistence seam for accounts, polls and votes.
//!
//! Two backends implement [`Repository`]:
//! - `postgres`: sea-orm over a Postgres connection
//! - `memory`: DashMap tables, used by tests and local development

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use crate::models::{Account, OptionAvailability, Poll, PollAccountAvailability};
use async_trait::async_trait;
use sea_orm::DbErr;

/// Persistence failures.
#[derive(Debug)]
pub enum StoreError {
    /// Database driver error
    Db(DbErr),
    /// A JSON column could not be encoded or decoded
    Encoding(serde_json::Error),
    /// A write that must return a row returned none
    MissingRow(&'static str),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Db(e) => write!(f, "Database error: {}", e),
            StoreError::Encoding(e) => write!(f, "Encoding error: {}", e),
            StoreError::MissingRow(what) => write!(f, "No row returned for {}", what),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        StoreError::Db(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Encoding(e)
    }
}

/// Storage operations needed by the account, poll and vote stores.
///
/// Single statements are atomic. Cross-statement sequences (count then
/// insert) are not, and callers must tolerate that.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Insert an account or return the existing row for the same email.
    ///
    /// Concurrent calls for one email all observe the same account id.
    async fn upsert_account(
        &self,
        email: &str,
        username: &str,
        name: &str,
    ) -> Result<Account, StoreError>;

    async fn count_polls(&self, account_id: i64) -> Result<u64, StoreError>;

    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError>;

    async fn find_poll(&self, poll_id: &str) -> Result<Option<Poll>, StoreError>;

    /// Polls owned by the account, oldest first.
    async fn list_polls(&self, account_id: i64) -> Result<Vec<Poll>, StoreError>;

    /// Delete a poll scoped to its owner. Returns the deleted poll, or `None`
    /// when no poll with that id belongs to the account.
    async fn delete_poll(&self, account_id: i64, poll_id: &str)
        -> Result<Option<Poll>, StoreError>;

    /// Insert or replace the availability set of one account on one poll.
    async fn upsert_vote(
        &self,
        poll_id: &str,
        account_id: i64,
        availabilities: &[OptionAvailability],
    ) -> Result<PollAccountAvailability, StoreError>;

    async fn find_vote(
        &self,
        poll_id: &str,
        account_id: i64,
    ) -> Result<Option<PollAccountAvailability>, StoreError>;

    async fn list_votes(&self, poll_id: &str) -> Result<Vec<PollAccountAvailability>, StoreError>;

    /// Cheap connectivity check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
