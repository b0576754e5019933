use std::{future::Future, time::Duration};

use log::*;

use crate::{
    db_types::{OrderId, TrackingInfo},
    providers::{Campaign, NotificationError, SubscriberFields, SubscriberProvider, SubscriberUpsert},
};

pub const TRACKING_EMAIL_SUBJECT: &str = "Your Order is on its way! 🚚";
const DEFAULT_GREETING_NAME: &str = "Valued Customer";

/// Sends the "your order has shipped" email through the newsletter provider.
pub struct NotificationApi<N> {
    provider: N,
    call_timeout: Duration,
}

impl<N> NotificationApi<N> {
    pub fn new(provider: N, call_timeout: Duration) -> Self {
        Self { provider, call_timeout }
    }
}

impl<N> NotificationApi<N>
where N: SubscriberProvider
{
    /// Upserts the subscriber with the tracking details, then sends them a one-off tracking campaign.
    pub async fn notify_shipped(
        &self,
        email: &str,
        name: Option<&str>,
        order_id: &OrderId,
        tracking: &TrackingInfo,
    ) -> Result<SubscriberUpsert, NotificationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(NotificationError::MissingEmail);
        }
        let fields = SubscriberFields {
            name: name.map(String::from),
            tracking_number: tracking.tracking_number.clone(),
            tracking_url: tracking.tracking_url.clone(),
            order_id: Some(order_id.to_string()),
        };
        let upsert = match self.timed(self.provider.create_subscriber(email, &fields)).await {
            Ok(()) => SubscriberUpsert::Created,
            Err(NotificationError::SubscriberExists(_)) => {
                debug!("📧️ {email} is already subscribed. Updating their details");
                // Existing subscribers keep the name they signed up with
                let fields = SubscriberFields { name: None, ..fields };
                self.timed(self.provider.update_subscriber(email, &fields)).await?;
                SubscriberUpsert::Updated
            },
            Err(e) => return Err(e),
        };
        let campaign = tracking_email(email, name, order_id, tracking);
        self.timed(self.provider.send_campaign(&campaign)).await?;
        info!("📧️ Tracking email for order {order_id} sent to {email}");
        Ok(upsert)
    }

    async fn timed<T, F>(&self, call: F) -> Result<T, NotificationError>
    where F: Future<Output = Result<T, NotificationError>> {
        tokio::time::timeout(self.call_timeout, call).await.map_err(|_| NotificationError::Timeout)?
    }
}

pub fn tracking_email(email: &str, name: Option<&str>, order_id: &OrderId, tracking: &TrackingInfo) -> Campaign {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_GREETING_NAME);
    let number = tracking.tracking_number.as_deref().unwrap_or("");
    let url = tracking.tracking_url.as_deref().unwrap_or("");
    let html = format!(
        "<h1>Thank you for your order!</h1>\n<p>Dear {name},</p>\n<p>Your order has been shipped and is on its way to \
         you.</p>\n<p>Tracking Number: {number}</p>\n<p>Track your package: <a href=\"{url}\">Click here to track your \
         order</a></p>\n<p>Order ID: {order_id}</p>\n<p>Thank you for choosing Dose Daily!</p>\n"
    );
    let plain = format!(
        "Thank you for your order!\n\nDear {name},\n\nYour order has been shipped and is on its way to \
         you.\n\nTracking Number: {number}\nTrack your package: {url}\nOrder ID: {order_id}\n\nThank you for \
         choosing Dose Daily!\n"
    );
    Campaign {
        name: format!("Order Tracking - {order_id}"),
        subject: TRACKING_EMAIL_SUBJECT.to_string(),
        html,
        plain,
        recipients: vec![email.to_string()],
    }
}
