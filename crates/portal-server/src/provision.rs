//! Startup provisioning of backing resources
//!
//! Runs only when `AUTO_PROVISION` is set. Every step is best-effort: a
//! failure is logged and the server starts anyway. Without a topic ARN the
//! notifier fails each send, which callers already tolerate.

use aws_sdk_sns::Client as SnsClient;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::NotificationConfig;
use crate::db;
use crate::notify::SnsNotifier;
use crate::storage::S3BlobStore;

/// Outcome of each provisioning step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub migrations: bool,
    pub bucket: bool,
    pub topic_arn: Option<String>,
}

pub async fn provision(
    pool: &PgPool,
    blobs: &S3BlobStore,
    sns: &SnsClient,
    notifications: &NotificationConfig,
) -> ProvisionReport {
    let migrations = match db::run_migrations(pool).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Migrations failed");
            false
        },
    };

    let bucket = match blobs.ensure_bucket().await {
        Ok(()) => true,
        Err(e) => {
            warn!(bucket = %blobs.bucket(), error = %e, "Bucket provisioning failed");
            false
        },
    };

    let topic_arn = match &notifications.topic_arn {
        Some(arn) => Some(arn.clone()),
        None => match SnsNotifier::ensure_topic(sns, &notifications.topic_name).await {
            Ok(arn) => Some(arn),
            Err(e) => {
                warn!(topic = %notifications.topic_name, error = %e, "Topic provisioning failed");
                None
            },
        },
    };

    let report = ProvisionReport {
        migrations,
        bucket,
        topic_arn,
    };
    info!(?report, "Provisioning finished");
    report
}
