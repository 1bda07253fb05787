//! Notifier backed by an SNS topic
//!
//! Every message is published to one topic with a `recipient` message
//! attribute. Each subscribed address carries a filter policy on that
//! attribute, so it only receives messages addressed to it.
//!
//! A notifier built without a topic fails every call with a [`NotifyError`],
//! which callers log and move past.

use async_trait::async_trait;
use aws_sdk_sns::{config::Region, types::MessageAttributeValue, Client};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{Notification, Notifier, NotifyError};

const RECIPIENT_ATTRIBUTE: &str = "recipient";

#[derive(Clone)]
pub struct SnsNotifier {
    client: Client,
    topic_arn: Option<String>,
}

impl SnsNotifier {
    pub fn new(client: Client, topic_arn: Option<String>) -> Self {
        Self { client, topic_arn }
    }

    pub fn client(sdk_config: &aws_config::SdkConfig, region: &str) -> Client {
        let config = aws_sdk_sns::config::Builder::from(sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Client::from_conf(config)
    }

    /// Create the topic (idempotent) and return its ARN
    #[instrument(skip(client))]
    pub async fn ensure_topic(client: &Client, name: &str) -> Result<String, NotifyError> {
        let output = client
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|e| NotifyError::Provision {
                topic: name.to_string(),
                message: e.to_string(),
            })?;

        let arn = output
            .topic_arn()
            .map(str::to_string)
            .ok_or_else(|| NotifyError::Provision {
                topic: name.to_string(),
                message: "no topic ARN returned".to_string(),
            })?;

        info!(topic_arn = %arn, "Notification topic ready");
        Ok(arn)
    }

    pub fn topic_arn(&self) -> Option<&str> {
        self.topic_arn.as_deref()
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    #[instrument(skip(self))]
    async fn subscribe(&self, address: &str) -> Result<(), NotifyError> {
        let topic_arn = self.topic_arn().ok_or_else(|| NotifyError::Subscribe {
            address: address.to_string(),
            message: "no notification topic".to_string(),
        })?;
        let filter_policy = json!({ RECIPIENT_ATTRIBUTE: [address] }).to_string();

        self.client
            .subscribe()
            .topic_arn(topic_arn)
            .protocol("email")
            .endpoint(address)
            .attributes("FilterPolicy", filter_policy)
            .send()
            .await
            .map_err(|e| NotifyError::Subscribe {
                address: address.to_string(),
                message: e.to_string(),
            })?;

        debug!("Subscription requested");
        Ok(())
    }

    #[instrument(skip(self, notification), fields(recipient = %notification.recipient, subject = %notification.subject))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let publish_error = |message: String| NotifyError::Publish {
            recipient: notification.recipient.clone(),
            message,
        };
        let topic_arn = self
            .topic_arn()
            .ok_or_else(|| publish_error("no notification topic".to_string()))?;

        let recipient = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(&notification.recipient)
            .build()
            .map_err(|e| publish_error(e.to_string()))?;

        self.client
            .publish()
            .topic_arn(topic_arn)
            .subject(&notification.subject)
            .message(&notification.body)
            .message_attributes(RECIPIENT_ATTRIBUTE, recipient)
            .send()
            .await
            .map_err(|e| publish_error(e.to_string()))?;

        debug!("Notification published");
        Ok(())
    }
}
