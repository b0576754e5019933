use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde_json::Value;

use crate::{
    config::MailerLiteConfig,
    data_objects::mailerlite::{Campaign, CampaignResponse, NewCampaign, NewSubscriber, Subscriber, SubscriberResponse},
    rest::{build_client, send_request},
    ProviderApiError,
};

#[derive(Clone)]
pub struct MailerLiteApi {
    config: MailerLiteConfig,
    client: Arc<Client>,
}

impl MailerLiteApi {
    pub fn new(config: MailerLiteConfig, timeout: Duration) -> Result<Self, ProviderApiError> {
        if !config.is_configured() {
            return Err(ProviderApiError::NotConfigured("MailerLite"));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token.reveal()))
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = build_client(headers, timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub async fn create_subscriber(&self, subscriber: &NewSubscriber) -> Result<Subscriber, ProviderApiError> {
        let req = self.client.post(self.url("/subscribers")).json(subscriber);
        let result = send_request::<SubscriberResponse>(req).await?;
        debug!("📧️ MailerLite subscriber {} saved", result.data.id);
        Ok(result.data)
    }

    pub async fn update_subscriber(&self, subscriber: &NewSubscriber) -> Result<Subscriber, ProviderApiError> {
        let path = format!("/subscribers/{}", subscriber.email);
        let body = serde_json::json!({ "fields": subscriber.fields });
        let req = self.client.put(self.url(&path)).json(&body);
        let result = send_request::<SubscriberResponse>(req).await?;
        debug!("📧️ MailerLite subscriber {} updated", result.data.id);
        Ok(result.data)
    }

    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, ProviderApiError> {
        let req = self.client.post(self.url("/campaigns")).json(campaign);
        let result = send_request::<CampaignResponse>(req).await?;
        debug!("📧️ MailerLite campaign {} created", result.data.id);
        Ok(result.data)
    }

    /// Sends a draft campaign straight away.
    pub async fn send_campaign_now(&self, campaign_id: &str) -> Result<(), ProviderApiError> {
        let path = format!("/campaigns/{campaign_id}/schedule");
        let req = self.client.post(self.url(&path)).json(&serde_json::json!({ "delivery": "instant" }));
        let _ = send_request::<Value>(req).await?;
        info!("📧️ MailerLite campaign {campaign_id} sent");
        Ok(())
    }
}
