use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::string_or_number;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippoAddress {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub street1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub zip: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_residential: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippoObject {
    pub object_id: String,
}

/// Shippo takes dimensions as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippoParcel {
    pub length: String,
    pub width: String,
    pub height: String,
    pub distance_unit: String,
    pub weight: String,
    pub mass_unit: String,
}

impl ShippoParcel {
    pub fn metric(length_cm: u32, width_cm: u32, height_cm: u32, weight_kg: u32) -> Self {
        Self {
            length: length_cm.to_string(),
            width: width_cm.to_string(),
            height: height_cm.to_string(),
            distance_unit: "cm".to_string(),
            weight: weight_kg.to_string(),
            mass_unit: "kg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShipment {
    pub address_from: String,
    pub address_to: String,
    pub parcels: Vec<ShippoParcel>,
    #[serde(rename = "async")]
    pub is_async: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceLevel {
    pub name: Option<String>,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippoRate {
    pub object_id: String,
    pub provider: String,
    #[serde(default)]
    pub servicelevel: ServiceLevel,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippoShipment {
    pub object_id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub rates: Vec<ShippoRate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub rate: String,
    pub label_file_type: String,
    #[serde(rename = "async")]
    pub is_async: bool,
}

impl NewTransaction {
    pub fn pdf(rate: &str) -> Self {
        Self { rate: rate.to_string(), label_file_type: "PDF".to_string(), is_async: false }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippoTransaction {
    pub object_id: String,
    /// `SUCCESS`, `QUEUED`, `WAITING` or `ERROR`
    pub status: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub tracking_number: Option<String>,
    pub tracking_url_provider: Option<String>,
    /// A plain status string or a tracking object with a `status` field
    pub tracking_status: Option<Value>,
    pub eta: Option<String>,
    pub label_url: Option<String>,
    #[serde(default)]
    pub messages: Vec<Value>,
}

impl ShippoTransaction {
    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }

    pub fn tracking_status(&self) -> Option<String> {
        match &self.tracking_status {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(o)) => o.get("status").and_then(Value::as_str).map(String::from),
            _ => None,
        }
    }

    pub fn error_messages(&self) -> String {
        let messages = self
            .messages
            .iter()
            .map(|m| m["text"].as_str().map(String::from).unwrap_or_else(|| m.to_string()))
            .collect::<Vec<_>>();
        messages.join("; ")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShippoLineItem {
    pub title: String,
    pub quantity: u32,
    pub total_price: String,
    pub currency: String,
    pub weight: String,
    pub weight_unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShippoOrder {
    pub to_address: ShippoAddress,
    pub from_address: ShippoAddress,
    pub line_items: Vec<ShippoLineItem>,
    pub placed_at: String,
    pub order_number: String,
    pub order_status: String,
    pub total_price: String,
    pub currency: String,
    pub weight: String,
    pub weight_unit: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackingSlip {
    pub slip_url: String,
    pub expires: Option<String>,
}
