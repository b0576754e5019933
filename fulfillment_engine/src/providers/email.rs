use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("The email provider is not configured")]
    NotConfigured,
    #[error("Subscriber {0} already exists")]
    SubscriberExists(String),
    #[error("No email address is known for this order")]
    MissingEmail,
    #[error("The email provider did not respond in time")]
    Timeout,
    #[error("Email provider error: {0}")]
    ProviderError(String),
}

/// Custom subscriber fields used to personalise the tracking email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberUpsert {
    Created,
    Updated,
}

/// A one-off email sent to an explicit list of subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub subject: String,
    pub html: String,
    pub plain: String,
    pub recipients: Vec<String>,
}

#[allow(async_fn_in_trait)]
pub trait SubscriberProvider {
    /// Creates the subscriber. Returns [`NotificationError::SubscriberExists`] if the address is already subscribed.
    async fn create_subscriber(&self, email: &str, fields: &SubscriberFields) -> Result<(), NotificationError>;

    async fn update_subscriber(&self, email: &str, fields: &SubscriberFields) -> Result<(), NotificationError>;

    async fn send_campaign(&self, campaign: &Campaign) -> Result<(), NotificationError>;
}
