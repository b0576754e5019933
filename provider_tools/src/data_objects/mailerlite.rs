use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSubscriber {
    pub email: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberResponse {
    pub data: Subscriber,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignContent {
    pub html: String,
    pub plain: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CampaignRecipients {
    pub segments: Vec<String>,
    pub groups: Vec<String>,
    pub subscribers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCampaign {
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: String,
    pub subject: String,
    pub content: CampaignContent,
    pub recipients: CampaignRecipients,
}

impl NewCampaign {
    /// A one-off campaign addressed to individual subscribers.
    pub fn to_subscribers(name: String, subject: String, content: CampaignContent, emails: Vec<String>) -> Self {
        let recipients = CampaignRecipients { subscribers: emails, ..Default::default() };
        Self { name, campaign_type: "regular".to_string(), subject, content, recipients }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignResponse {
    pub data: Campaign,
}
