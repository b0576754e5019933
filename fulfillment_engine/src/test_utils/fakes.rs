//! In-memory stand-ins for the shipping and email providers.
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::providers::{
    Campaign,
    LabelPurchase,
    NotificationError,
    Parcel,
    Shipment,
    ShippingError,
    ShippingOrderRequest,
    ShippingParty,
    ShippingProvider,
    ShippingRate,
    SubscriberFields,
    SubscriberProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShippingBehaviour {
    #[default]
    Succeed,
    /// Every call sleeps for this long before answering
    Hang(Duration),
    NoRates,
    LabelFails,
}

#[derive(Debug, Clone, Default)]
pub struct FakeShipping {
    pub behaviour: ShippingBehaviour,
    pub rates: Vec<ShippingRate>,
    calls: Arc<Mutex<Vec<String>>>,
    labels: Arc<Mutex<u64>>,
}

impl FakeShipping {
    pub fn new(behaviour: ShippingBehaviour) -> Self {
        let rates = vec![
            ShippingRate {
                object_id: "rate_rm".into(),
                provider: "Royal Mail".into(),
                servicelevel_token: "royal_mail_2nd".into(),
                servicelevel_name: Some("2nd Class".into()),
                amount: "3.20".into(),
                currency: "GBP".into(),
            },
            ShippingRate {
                object_id: "rate_hermes".into(),
                provider: "Hermes UK".into(),
                servicelevel_token: "hermes_uk_parcelshop_dropoff".into(),
                servicelevel_name: Some("ParcelShop Drop-Off".into()),
                amount: "2.95".into(),
                currency: "GBP".into(),
            },
        ];
        Self { behaviour, rates, calls: Arc::default(), labels: Arc::default() }
    }

    /// The names of the provider calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn labels_purchased(&self) -> u64 {
        self.labels.lock().map(|n| *n).unwrap_or_default()
    }

    async fn record(&self, call: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.to_string());
        }
        if let ShippingBehaviour::Hang(d) = self.behaviour {
            tokio::time::sleep(d).await;
        }
    }
}

impl ShippingProvider for FakeShipping {
    async fn create_address(&self, party: &ShippingParty) -> Result<String, ShippingError> {
        self.record("create_address").await;
        Ok(format!("addr_{}", party.zip.replace(' ', "")))
    }

    async fn create_shipment(
        &self,
        _from_address_id: &str,
        _to_address_id: &str,
        parcels: &[Parcel],
    ) -> Result<Shipment, ShippingError> {
        self.record("create_shipment").await;
        let rates = match self.behaviour {
            ShippingBehaviour::NoRates => vec![],
            _ => self.rates.clone(),
        };
        Ok(Shipment { object_id: format!("shipment_{}", parcels.len()), rates })
    }

    async fn create_transaction(&self, rate_id: &str) -> Result<LabelPurchase, ShippingError> {
        self.record("create_transaction").await;
        if self.behaviour == ShippingBehaviour::LabelFails {
            return Err(ShippingError::LabelFailed("Rate has expired".into()));
        }
        let n = match self.labels.lock() {
            Ok(mut n) => {
                *n += 1;
                *n
            },
            Err(_) => 0,
        };
        Ok(LabelPurchase {
            object_id: format!("txn_{rate_id}_{n}"),
            tracking_number: Some(format!("H00{n}")),
            tracking_url: Some(format!("https://track.example.com/H00{n}")),
            tracking_status: Some("PRE_TRANSIT".into()),
            eta: None,
            label_url: Some(format!("https://labels.example.com/{n}.pdf")),
        })
    }

    async fn create_order(&self, order: &ShippingOrderRequest) -> Result<String, ShippingError> {
        self.record("create_order").await;
        Ok(format!("shippo_order_{}", order.order_number))
    }

    async fn packing_slip(&self, shipping_order_id: &str) -> Result<String, ShippingError> {
        self.record("packing_slip").await;
        Ok(format!("https://slips.example.com/{shipping_order_id}.pdf"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeMailer {
    pub fail: bool,
    subscribers: Arc<Mutex<HashSet<String>>>,
    campaigns: Arc<Mutex<Vec<Campaign>>>,
}

impl FakeMailer {
    pub fn with_subscriber(self, email: &str) -> Self {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.insert(email.to_string());
        }
        self
    }

    pub fn campaigns(&self) -> Vec<Campaign> {
        self.campaigns.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl SubscriberProvider for FakeMailer {
    async fn create_subscriber(&self, email: &str, _fields: &SubscriberFields) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::ProviderError("Service unavailable".into()));
        }
        let mut subs = self.subscribers.lock().map_err(|e| NotificationError::ProviderError(e.to_string()))?;
        if !subs.insert(email.to_string()) {
            return Err(NotificationError::SubscriberExists(email.to_string()));
        }
        Ok(())
    }

    async fn update_subscriber(&self, _email: &str, _fields: &SubscriberFields) -> Result<(), NotificationError> {
        Ok(())
    }

    async fn send_campaign(&self, campaign: &Campaign) -> Result<(), NotificationError> {
        let mut campaigns = self.campaigns.lock().map_err(|e| NotificationError::ProviderError(e.to_string()))?;
        campaigns.push(campaign.clone());
        Ok(())
    }
}
