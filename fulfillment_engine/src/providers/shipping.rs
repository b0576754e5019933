use chrono::{DateTime, Utc};
use dd_common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{LineItem, ShippingAddress},
    helpers::{normalize_country, normalize_postcode},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingError {
    #[error("The shipping provider is not configured")]
    NotConfigured,
    #[error("Address is missing the required field '{0}'")]
    MissingAddressField(&'static str),
    #[error("Could not create the {0} address: {1}")]
    AddressRejected(String, String),
    #[error("No shipping rates were returned for the shipment")]
    NoRates,
    #[error("The label purchase failed: {0}")]
    LabelFailed(String),
    #[error("The shipping provider did not respond in time")]
    Timeout,
    #[error("Shipping provider error: {0}")]
    ProviderError(String),
}

/// An address in the form the shipping provider expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingParty {
    pub name: String,
    pub company: Option<String>,
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zip: String,
    /// ISO 3166 alpha-2
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_residential: bool,
}

impl ShippingParty {
    /// The business dispatch address.
    pub fn origin() -> Self {
        Self {
            name: "Dose Daily".into(),
            company: Some("Dose Daily".into()),
            street1: "36 Woodacre".into(),
            street2: None,
            city: "Bristol".into(),
            state: Some("Avon".into()),
            zip: "BS20 7BT".into(),
            country: "GB".into(),
            phone: Some("077990266704".into()),
            email: None,
            is_residential: false,
        }
    }

    /// Builds the recipient from a customer address, normalising the country and postcode. Fails if any field the
    /// carrier needs is blank.
    pub fn from_customer(address: &ShippingAddress, email: Option<&str>) -> Result<Self, ShippingError> {
        let country = normalize_country(&address.country);
        let zip = normalize_postcode(&address.postal_code, &country);
        let party = Self {
            name: if address.name.trim().is_empty() { "Customer".into() } else { address.name.trim().to_string() },
            company: None,
            street1: address.line1.trim().to_string(),
            street2: address.line2.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            city: address.city.trim().to_string(),
            state: address.state.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            zip,
            country,
            phone: address.phone.clone().filter(|s| !s.trim().is_empty()),
            email: address.email.clone().or_else(|| email.map(String::from)),
            is_residential: true,
        };
        party.validate()?;
        Ok(party)
    }

    pub fn validate(&self) -> Result<(), ShippingError> {
        let required = [
            ("name", &self.name),
            ("street1", &self.street1),
            ("city", &self.city),
            ("zip", &self.zip),
            ("country", &self.country),
        ];
        match required.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((field, _)) => Err(ShippingError::MissingAddressField(*field)),
            None => Ok(()),
        }
    }
}

/// Parcel dimensions in cm and weight in kg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
    pub weight_kg: u32,
}

impl Default for Parcel {
    fn default() -> Self {
        Self { length_cm: 25, width_cm: 20, height_cm: 5, weight_kg: 1 }
    }
}

impl Parcel {
    /// One placeholder parcel per line item.
    pub fn for_items(items: &[LineItem]) -> Vec<Parcel> {
        items.iter().map(|_| Parcel::default()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub object_id: String,
    /// Carrier name, e.g. "Hermes UK"
    pub provider: String,
    pub servicelevel_token: String,
    pub servicelevel_name: Option<String>,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub object_id: String,
    pub rates: Vec<ShippingRate>,
}

/// The result of buying a label against a rate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelPurchase {
    pub object_id: String,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub tracking_status: Option<String>,
    pub eta: Option<String>,
    pub label_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOrderRequest {
    pub order_number: String,
    pub to: ShippingParty,
    pub from: ShippingParty,
    pub items: Vec<LineItem>,
    pub placed_at: DateTime<Utc>,
    pub total_price: Money,
    pub currency: String,
    pub weight_kg: u32,
}

#[allow(async_fn_in_trait)]
pub trait ShippingProvider {
    /// Registers an address with the provider and returns its object id.
    async fn create_address(&self, party: &ShippingParty) -> Result<String, ShippingError>;

    async fn create_shipment(
        &self,
        from_address_id: &str,
        to_address_id: &str,
        parcels: &[Parcel],
    ) -> Result<Shipment, ShippingError>;

    /// Purchases a PDF label for the given rate.
    async fn create_transaction(&self, rate_id: &str) -> Result<LabelPurchase, ShippingError>;

    /// Creates a provider-side order, used for picking and packing. Returns the order's object id.
    async fn create_order(&self, order: &ShippingOrderRequest) -> Result<String, ShippingError>;

    /// Returns the URL of the packing slip for a provider-side order.
    async fn packing_slip(&self, shipping_order_id: &str) -> Result<String, ShippingError>;
}
