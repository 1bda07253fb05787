//! Record store for accounts, scores and complaints
//!
//! Lookups return `Ok(None)` for absent records; `Err` is reserved for real
//! store failures. Batch puts insert each record only if its key is still
//! free, run sequentially without a wrapping transaction and stop at the
//! first failing record. Records written before the failure stay written.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::models::{Account, Complaint, Score, ScoreFilter, ScoreKey};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

/// Record store failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Stored row cannot be mapped back to a record
    #[error("Corrupt record {key}: {message}")]
    Corrupt { key: String, message: String },

    /// Store rejected the call or is unreachable
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// A batch stopped partway; records at `written` indices are persisted
    #[error("Batch write stopped after {} of {attempted} records: {source}", written.len())]
    PartialBatch {
        written: Vec<usize>,
        attempted: usize,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn corrupt(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Wrap a per-record failure into a batch failure
    fn partial(written: Vec<usize>, attempted: usize, source: StoreError) -> Self {
        Self::PartialBatch {
            written,
            attempted,
            source: Box::new(source),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a batch put
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchWrite {
    /// Indices (into the submitted slice) of records that were inserted.
    /// Records whose key already existed are absent.
    pub written: Vec<usize>,
}

impl BatchWrite {
    pub fn count(&self) -> usize {
        self.written.len()
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn get_account(&self, username: &str) -> StoreResult<Option<Account>>;

    async fn find_account_by_reset_token(&self, token: &str) -> StoreResult<Option<Account>>;

    /// Insert accounts whose username is not yet taken
    async fn put_accounts(&self, accounts: &[Account]) -> StoreResult<BatchWrite>;

    /// Replace the password hash of `username`; `false` if it does not exist
    async fn set_password(&self, username: &str, password_hash: &str) -> StoreResult<bool>;

    /// Store a reset token for `username`, replacing any earlier one
    async fn set_reset_token(&self, username: &str, token: &str) -> StoreResult<bool>;

    /// Atomically swap the password of the holder of `token` and clear the
    /// token. Returns the username, or `None` if no account holds `token`.
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> StoreResult<Option<String>>;

    async fn get_score(&self, key: &ScoreKey) -> StoreResult<Option<Score>>;

    /// Insert scores whose (student_id, subject) pair is not yet taken
    async fn put_scores(&self, scores: &[Score]) -> StoreResult<BatchWrite>;

    async fn list_scores(&self, filter: &ScoreFilter) -> StoreResult<Vec<Score>>;

    /// Insert a complaint; `false` if the id is already taken
    async fn put_complaint(&self, complaint: &Complaint) -> StoreResult<bool>;

    async fn get_complaint(&self, id: &str) -> StoreResult<Option<Complaint>>;

    /// Overwrite an existing complaint; `false` if it does not exist
    async fn update_complaint(&self, complaint: &Complaint) -> StoreResult<bool>;

    /// All complaints, oldest first
    async fn list_complaints(&self) -> StoreResult<Vec<Complaint>>;
}

pub async fn create_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
