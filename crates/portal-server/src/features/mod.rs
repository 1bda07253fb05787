//! Feature modules implementing the portal API
//!
//! Each feature is a vertical slice:
//! - `commands/` - write operations, one struct plus a `handle` function each
//! - `queries/` - read operations
//! - `routes.rs` - HTTP wiring and role checks
//!
//! # Features
//!
//! - **accounts**: roster uploads, self-registration, credential checks
//! - **scores**: result uploads and result listings
//! - **complaints**: submission, listing and resolution
//! - **passwords**: reset request/confirm and password change

pub mod accounts;
pub mod complaints;
pub mod passwords;
pub mod scores;
pub mod shared;

use axum::Router;
use std::sync::Arc;

use crate::config::NotificationConfig;
use crate::db::RecordStore;
use crate::ingest::IngestContext;
use crate::notify::{Messages, Notifier};
use crate::storage::BlobStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub store: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub messages: Messages,
    /// Recipient of complaint notifications
    pub teachers_address: String,
}

impl FeatureState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        notifications: &NotificationConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            notifier,
            messages: Messages::new(&notifications.frontend_url),
            teachers_address: notifications.teachers_address.clone(),
        }
    }

    pub fn ingest_context(&self) -> IngestContext {
        IngestContext {
            store: self.store.clone(),
            blobs: self.blobs.clone(),
            notifier: self.notifier.clone(),
            messages: self.messages.clone(),
        }
    }
}

/// Creates the `/api/v1` router with all feature routes mounted
///
/// - `/admin/*` - roster uploads (ADMIN)
/// - `/teachers/*` - result uploads and listings (STAFF)
/// - `/students/*` - own results
/// - `/complaints` - complaint lifecycle
/// - `/password-reset`, `/change-password` - credentials
/// - `/register`, `/auth/verify` - accounts
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/admin", accounts::routes::admin_routes())
        .nest("/teachers", scores::routes::teacher_routes())
        .nest("/students", scores::routes::student_routes())
        .merge(accounts::routes::account_routes())
        .merge(complaints::routes::complaint_routes())
        .merge(passwords::routes::password_routes())
        .with_state(state)
}
