//! Result Portal Server Library
//!
//! Backend for a school result portal: administrators provision staff and
//! student accounts from CSV rosters, staff upload CSV result sheets,
//! students read their own results and file complaints.
//!
//! # Architecture
//!
//! - [`ingest`]: the CSV bulk-ingestion pipeline shared by roster and result
//!   uploads (archive, validate, deduplicate, batch write, notify)
//! - [`db`]: the [`db::RecordStore`] trait over accounts, scores and
//!   complaints, with PostgreSQL and in-memory implementations
//! - [`storage`]: the [`storage::BlobStore`] archive of uploaded files (S3)
//! - [`notify`]: the [`notify::Notifier`] trait (SNS) and message texts
//! - [`features`]: command/query slices exposed over axum under `/api/v1`
//! - [`auth`]: caller identity from the gateway and role checks
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use portal_server::{api, config::Config, db, features::FeatureState, notify, storage};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let state = FeatureState::new(
//!     Arc::new(db::MemoryRecordStore::new()),
//!     Arc::new(storage::MemoryBlobStore::new()),
//!     Arc::new(notify::MemoryNotifier::new()),
//!     &config.notifications,
//! );
//! let app = api::create_router(state, &config.cors);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod db;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod provision;
pub mod storage;

// Re-export commonly used types
pub use api::response::{AppError, ApiResult};
