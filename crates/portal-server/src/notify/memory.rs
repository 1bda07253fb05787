//! Recording notifier for tests and local runs

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{Notification, Notifier, NotifyError};

#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
    subscriptions: Mutex<Vec<String>>,
    failing_recipients: Mutex<BTreeSet<String>>,
    unavailable: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send and subscribe
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail sends addressed to `recipient`
    pub async fn fail_for(&self, recipient: &str) {
        self.failing_recipients
            .lock()
            .await
            .insert(recipient.to_string());
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: &str) -> Vec<Notification> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect()
    }

    pub async fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn subscribe(&self, address: &str) -> Result<(), NotifyError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(NotifyError::Subscribe {
                address: address.to_string(),
                message: "notifier unavailable".to_string(),
            });
        }
        self.subscriptions.lock().await.push(address.to_string());
        Ok(())
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let rejected = self.unavailable.load(Ordering::SeqCst)
            || self
                .failing_recipients
                .lock()
                .await
                .contains(&notification.recipient);

        if rejected {
            return Err(NotifyError::Publish {
                recipient: notification.recipient.clone(),
                message: "notifier unavailable".to_string(),
            });
        }

        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}
