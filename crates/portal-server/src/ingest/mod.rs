//! Bulk CSV ingestion
//!
//! Roster uploads (staff, students) and score uploads share one pipeline:
//!
//! 1. check the file extension
//! 2. archive the raw upload to the blob store
//! 3. validate the header row and parse every row (any invalid row aborts)
//! 4. drop rows whose key repeats within the file or already exists
//! 5. build records for the survivors and write them in one batch
//! 6. notify the owner of each written record
//!
//! Notification failures are logged and counted, never returned. A store
//! failure during the batch aborts the call without undoing earlier writes;
//! in that case nothing is notified.
//!
//! The per-upload differences live in an [`IngestPlan`]: [`roster::RosterPlan`]
//! and [`scores::ScorePlan`].

use async_trait::async_trait;
use portal_common::Role;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::db::{BatchWrite, RecordStore, StoreError};
use crate::features::shared::validation::validate_max_chars;
use crate::notify::{Messages, Notifier};
use crate::storage::{BlobError, BlobStore};

pub mod csv;
pub mod engine;
pub mod roster;
pub mod scores;

pub use self::csv::{CsvError, Row};
pub use engine::run;
pub use roster::RosterPlan;
pub use scores::ScorePlan;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Format(String),

    #[error("CSV is missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid row at line {line}: {message}")]
    Validation { line: u64, message: String },

    #[error("Failed to archive upload: {0}")]
    Archive(#[from] BlobError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl IngestError {
    pub fn validation(row: &Row, message: impl Into<String>) -> Self {
        Self::Validation {
            line: row.line(),
            message: message.into(),
        }
    }

    /// Reject `value` when it is longer than its column can hold
    pub fn check_length(
        row: &Row,
        field: &'static str,
        value: &str,
        max_length: usize,
    ) -> Result<(), Self> {
        validate_max_chars(value, field, max_length).map_err(|e| Self::validation(row, e.to_string()))
    }
}

impl From<CsvError> for IngestError {
    fn from(e: CsvError) -> Self {
        match e {
            CsvError::Format(message) => Self::Format(message),
            CsvError::Schema { missing } => Self::Schema { missing },
            parse @ CsvError::Parse { .. } => Self::Format(parse.to_string()),
        }
    }
}

/// Raw uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Collaborators shared by every ingestion
#[derive(Clone)]
pub struct IngestContext {
    pub store: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub messages: Messages,
}

/// Outcome of the notification stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotifyOutcome {
    pub sent: usize,
    pub failed: usize,
    /// Records whose owner has no known address
    pub unaddressed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub written_count: usize,
    /// Keys dropped as duplicates, in file order
    pub skipped: Vec<String>,
    pub notified: usize,
    pub notification_failures: usize,
    pub unaddressed: usize,
}

/// The parts of an ingestion that differ between upload kinds
#[async_trait]
pub trait IngestPlan: Send + Sync {
    /// Validated row, before any side effects
    type Draft: Send + Sync;
    /// Natural key used for deduplication
    type Key: Ord + Clone + Display + Send + Sync;
    /// Record written to the store
    type Record: Send + Sync;
    /// Per-record data the notification stage needs
    type Pending: Send + Sync;

    fn name(&self) -> &'static str;

    /// Blob store folder under `uploads/`
    fn archive_category(&self) -> &'static str;

    fn required_fields(&self) -> &'static [&'static str];

    fn parse_row(&self, row: &Row) -> Result<Self::Draft, IngestError>;

    fn draft_key(&self, draft: &Self::Draft) -> Self::Key;

    async fn exists(&self, store: &dyn RecordStore, key: &Self::Key) -> Result<bool, StoreError>;

    async fn materialize(
        &self,
        draft: Self::Draft,
    ) -> Result<(Self::Record, Self::Pending), IngestError>;

    async fn write_batch(
        &self,
        store: &dyn RecordStore,
        records: &[Self::Record],
    ) -> Result<BatchWrite, StoreError>;

    async fn notify(&self, ctx: &IngestContext, pending: Vec<Self::Pending>) -> NotifyOutcome;
}

/// Create accounts with `role` for every new username in a `username,email` CSV
pub async fn ingest_accounts(
    ctx: &IngestContext,
    upload: Upload,
    role: Role,
) -> Result<IngestReport, IngestError> {
    run(ctx, &RosterPlan::new(role), upload).await
}

/// Record every new (student_id, subject) score in a results CSV
pub async fn ingest_scores(
    ctx: &IngestContext,
    upload: Upload,
    uploaded_by: &str,
) -> Result<IngestReport, IngestError> {
    run(ctx, &ScorePlan::new(uploaded_by), upload).await
}
