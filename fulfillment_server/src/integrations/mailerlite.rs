use std::collections::BTreeMap;

use fulfillment_engine::providers::{Campaign, NotificationError, SubscriberFields, SubscriberProvider};
use log::*;
use provider_tools::{
    data_objects::mailerlite::{CampaignContent, NewCampaign, NewSubscriber},
    MailerLiteApi,
    ProviderApiError,
};

#[derive(Clone)]
pub struct MailerLiteSubscribers {
    api: Option<MailerLiteApi>,
}

impl MailerLiteSubscribers {
    pub fn new(api: Option<MailerLiteApi>) -> Self {
        Self { api }
    }

    fn api(&self) -> Result<&MailerLiteApi, NotificationError> {
        self.api.as_ref().ok_or(NotificationError::NotConfigured)
    }
}

impl SubscriberProvider for MailerLiteSubscribers {
    async fn create_subscriber(&self, email: &str, fields: &SubscriberFields) -> Result<(), NotificationError> {
        let subscriber = new_subscriber(email, fields);
        match self.api()?.create_subscriber(&subscriber).await {
            Ok(s) => {
                trace!("📧️ MailerLite subscriber {} created for {email}", s.id);
                Ok(())
            },
            Err(e) if e.is_already_exists() => Err(NotificationError::SubscriberExists(email.to_string())),
            Err(e) => Err(notification_error(e)),
        }
    }

    async fn update_subscriber(&self, email: &str, fields: &SubscriberFields) -> Result<(), NotificationError> {
        let subscriber = new_subscriber(email, fields);
        self.api()?.update_subscriber(&subscriber).await.map_err(notification_error)?;
        Ok(())
    }

    /// MailerLite sends campaigns in two steps. A campaign that was created but not sent stays as a draft in the
    /// MailerLite dashboard.
    async fn send_campaign(&self, campaign: &Campaign) -> Result<(), NotificationError> {
        let api = self.api()?;
        let content = CampaignContent { html: campaign.html.clone(), plain: campaign.plain.clone() };
        let request = NewCampaign::to_subscribers(
            campaign.name.clone(),
            campaign.subject.clone(),
            content,
            campaign.recipients.clone(),
        );
        let created = api.create_campaign(&request).await.map_err(notification_error)?;
        debug!("📧️ Campaign {} created as {}", campaign.name, created.id);
        api.send_campaign_now(&created.id).await.map_err(notification_error)
    }
}

fn notification_error(e: ProviderApiError) -> NotificationError {
    match e {
        ProviderApiError::Timeout => NotificationError::Timeout,
        ProviderApiError::NotConfigured(_) => NotificationError::NotConfigured,
        e => NotificationError::ProviderError(e.to_string()),
    }
}

pub fn new_subscriber(email: &str, fields: &SubscriberFields) -> NewSubscriber {
    let pairs = [
        ("name", &fields.name),
        ("tracking_number", &fields.tracking_number),
        ("tracking_url", &fields.tracking_url),
        ("order_id", &fields.order_id),
    ];
    let fields = pairs
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect::<BTreeMap<_, _>>();
    NewSubscriber { email: email.to_string(), fields }
}
