//! Common test utilities for portal server integration tests
//!
//! [`TestApp`] builds the full router over the in-memory record store, blob
//! store and notifier, and keeps handles to them so tests can seed data,
//! inject failures and inspect what was written or sent.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use portal_common::{Role, Secret};
use portal_server::{
    api,
    auth::USER_HEADER,
    config::{Config, NotificationConfig},
    credentials,
    db::{MemoryRecordStore, RecordStore},
    features::FeatureState,
    models::Account,
    notify::MemoryNotifier,
    storage::MemoryBlobStore,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const FRONTEND_URL: &str = "https://portal.test";
pub const TEACHERS_ADDRESS: &str = "teachers@school.test";

const BOUNDARY: &str = "portal-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryRecordStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub notifier: Arc<MemoryNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        init_test_tracing();

        let store = Arc::new(MemoryRecordStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let notifier = Arc::new(MemoryNotifier::new());

        let notifications = NotificationConfig {
            teachers_address: TEACHERS_ADDRESS.to_string(),
            frontend_url: FRONTEND_URL.to_string(),
            ..NotificationConfig::default()
        };
        let state = FeatureState::new(
            store.clone(),
            blobs.clone(),
            notifier.clone(),
            &notifications,
        );
        let router = api::create_router(state, &Config::default().cors);

        Self {
            router,
            store,
            blobs,
            notifier,
        }
    }

    /// Insert an account directly into the store
    pub async fn seed_account(&self, username: &str, role: Role, password: &str) -> Account {
        let hash = credentials::hash_password(&Secret::new(password)).unwrap();
        let account = Account::new(username, hash, role, format!("{}@school.test", username));
        let batch = self
            .store
            .put_accounts(std::slice::from_ref(&account))
            .await
            .unwrap();
        assert_eq!(batch.count(), 1, "account {} already seeded", username);
        account
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
        let request = with_user(Request::builder().uri(uri), user)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, user: Option<&str>, body: Value) -> (StatusCode, Value) {
        let request = with_user(Request::builder().method("POST").uri(uri), user)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST `data` as the multipart `file` field
    pub async fn upload(
        &self,
        uri: &str,
        user: Option<&str>,
        filename: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: text/csv\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = with_user(Request::builder().method("POST").uri(uri), user)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

fn with_user(builder: axum::http::request::Builder, user: Option<&str>) -> axum::http::request::Builder {
    match user {
        Some(username) => builder.header(USER_HEADER, username),
        None => builder,
    }
}

/// Error code of a failure body
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// Temporary password embedded in a welcome message body
pub fn temporary_password(body: &str) -> String {
    body.lines()
        .find_map(|line| line.strip_prefix("Temporary Password: "))
        .unwrap()
        .to_string()
}

/// Reset token embedded in a password reset message body
pub fn reset_token(body: &str) -> String {
    body.split("token=").nth(1).unwrap().trim().to_string()
}

/// Initialize tracing for tests
pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,portal_server=debug")),
        )
        .with_test_writer()
        .try_init();
}
