use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalPrice {
    /// Decimal string, e.g. `"55.99"`
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCharge {
    pub name: String,
    pub description: String,
    pub pricing_type: String,
    pub local_price: LocalPrice,
    pub metadata: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

impl NewCharge {
    pub fn fixed_price(name: &str, local_price: LocalPrice, order_id: &str) -> Self {
        let metadata = HashMap::from([("order_id".to_string(), order_id.to_string())]);
        Self {
            name: name.to_string(),
            description: format!("Order {order_id}"),
            pricing_type: "fixed_price".to_string(),
            local_price,
            metadata,
            redirect_url: None,
            cancel_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinbaseCharge {
    pub id: String,
    pub code: Option<String>,
    pub hosted_url: Option<String>,
    /// Values are usually strings, but merchants can put anything here
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl CoinbaseCharge {
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get("order_id").and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.metadata.get("customer_email").and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChargeResponse {
    pub data: CoinbaseCharge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinbaseEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: CoinbaseCharge,
}

/// The body of a Coinbase Commerce webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinbaseWebhook {
    pub event: CoinbaseEvent,
}
