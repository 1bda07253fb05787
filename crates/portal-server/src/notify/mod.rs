//! Notifier: delivers (subject, body, recipient) messages
//!
//! Delivery is fire-and-forget from the caller's side. [`fan_out`] sends a
//! batch concurrently and reports failures without propagating them.

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

pub mod memory;
pub mod messages;
pub mod sns;

pub use memory::MemoryNotifier;
pub use messages::Messages;
pub use sns::SnsNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to deliver notification to {recipient}: {message}")]
    Publish { recipient: String, message: String },

    #[error("Failed to subscribe {address}: {message}")]
    Subscribe { address: String, message: String },

    #[error("Failed to provision notification topic {topic}: {message}")]
    Provision { topic: String, message: String },
}

/// A message to one recipient address.
///
/// Bodies may carry temporary credentials, so `Debug` only shows the length.
#[derive(Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

impl Notification {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipient: recipient.into(),
        }
    }
}

impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("subject", &self.subject)
            .field("recipient", &self.recipient)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Register `address` so that messages addressed to it are delivered
    async fn subscribe(&self, address: &str) -> Result<(), NotifyError>;

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Result of a concurrent batch send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send every notification concurrently.
///
/// Failures are logged and counted; they never abort the batch. Order of
/// delivery is unspecified.
pub async fn fan_out(notifier: &dyn Notifier, notifications: &[Notification]) -> FanOutReport {
    let outcomes = join_all(notifications.iter().map(|n| async move {
        match notifier.send(n).await {
            Ok(()) => true,
            Err(e) => {
                warn!(recipient = %n.recipient, subject = %n.subject, error = %e, "Notification failed");
                false
            },
        }
    }))
    .await;

    let sent = outcomes.iter().filter(|ok| **ok).count();
    let report = FanOutReport {
        sent,
        failed: outcomes.len() - sent,
    };
    info!(sent = report.sent, failed = report.failed, "Notification fan-out finished");
    report
}

/// Send one notification, logging instead of returning a failure
pub async fn send_quietly(notifier: &dyn Notifier, notification: &Notification) -> bool {
    match notifier.send(notification).await {
        Ok(()) => true,
        Err(e) => {
            warn!(recipient = %notification.recipient, subject = %notification.subject, error = %e, "Notification failed");
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_body() {
        let n = Notification::new("Your Student Account", "Temporary Password: hunter2", "a@x.com");
        let rendered = format!("{:?}", n);
        assert!(rendered.contains("a@x.com"));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_fan_out_counts_failures() {
        let notifier = MemoryNotifier::new();
        notifier.fail_for("b@x.com").await;

        let report = fan_out(
            &notifier,
            &[
                Notification::new("Results Ready", "body", "a@x.com"),
                Notification::new("Results Ready", "body", "b@x.com"),
                Notification::new("Results Ready", "body", "c@x.com"),
            ],
        )
        .await;

        assert_eq!(report, FanOutReport { sent: 2, failed: 1 });
        assert_eq!(notifier.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn test_send_quietly_swallows_errors() {
        let notifier = MemoryNotifier::new();
        notifier.set_unavailable(true);
        let delivered =
            send_quietly(&notifier, &Notification::new("Subject", "body", "teachers")).await;
        assert!(!delivered);
    }
}
