use std::fmt::Display;

use chrono::{DateTime, Utc};
use fulfillment_engine::{
    db_types::{DiscountCode, DiscountType, OrderId},
    providers::CheckoutSession,
    FulfillmentResult,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Names an order in the store, for the endpoints that start a checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(alias = "orderId")]
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub session: CheckoutSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalCaptureRequest {
    /// PayPal's order id, not ours
    #[serde(alias = "orderID", alias = "orderId")]
    pub paypal_order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerificationResponse {
    pub success: bool,
    pub payment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<FulfillmentResult>,
}

impl PaymentVerificationResponse {
    pub fn paid(result: FulfillmentResult) -> Self {
        Self { success: true, payment_status: "paid".to_string(), error: None, fulfillment: Some(result) }
    }

    pub fn not_paid(status: String) -> Self {
        let error = Some("Payment was not completed".to_string());
        Self { success: false, payment_status: status, error, fulfillment: None }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountSummary {
    pub code: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub used: bool,
}

impl From<DiscountCode> for DiscountSummary {
    fn from(d: DiscountCode) -> Self {
        Self {
            code: d.code,
            email: d.email,
            expires_at: d.expires_at,
            discount_type: d.discount_type,
            discount_value: d.discount_value,
            used: d.used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountSummary>,
}

impl DiscountValidation {
    pub fn valid(discount: DiscountCode) -> Self {
        Self { valid: true, message: None, discount: Some(discount.into()) }
    }

    pub fn invalid<S: Display>(reason: S) -> Self {
        Self { valid: false, message: Some(reason.to_string()), discount: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    pub fn received(order_id: Option<OrderId>, message: Option<String>) -> Self {
        Self { received: true, order_id, message }
    }
}
