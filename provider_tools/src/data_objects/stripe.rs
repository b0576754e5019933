use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line on a hosted Checkout page. Amounts are in minor units (pence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeLineItem {
    pub name: String,
    pub unit_amount: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default)]
pub struct NewCheckoutSession {
    pub line_items: Vec<StripeLineItem>,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub client_reference_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl NewCheckoutSession {
    /// Stripe takes form-encoded bodies with bracketed keys. Metadata is copied onto the payment intent too, so that
    /// `payment_intent.*` webhook events can be traced back to the order.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        let currency = self.currency.to_ascii_lowercase();
        for (i, item) in self.line_items.iter().enumerate() {
            form.push((format!("line_items[{i}][price_data][currency]"), currency.clone()));
            form.push((format!("line_items[{i}][price_data][product_data][name]"), item.name.clone()));
            form.push((format!("line_items[{i}][price_data][unit_amount]"), item.unit_amount.to_string()));
            form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }
        if let Some(email) = &self.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }
        if let Some(reference) = &self.client_reference_id {
            form.push(("client_reference_id".to_string(), reference.clone()));
        }
        for (k, v) in &self.metadata {
            form.push((format!("metadata[{k}]"), v.clone()));
            form.push((format!("payment_intent_data[metadata][{k}]"), v.clone()));
        }
        form
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripeAddress {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripeShippingDetails {
    pub name: Option<String>,
    pub address: Option<StripeAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub status: Option<String>,
    pub payment_status: String,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub shipping_details: Option<StripeShippingDetails>,
}

impl StripeCheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get("order_id").map(String::as_str).or(self.client_reference_id.as_deref())
    }

    /// The payment intent if Stripe created one, else the session itself.
    pub fn payment_id(&self) -> &str {
        self.payment_intent.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|c| c.email.as_deref()).or(self.customer_email.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl StripePaymentIntent {
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get("order_id").map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

/// A webhook delivery. `data.object` is kept as raw JSON until the event type says what it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}
