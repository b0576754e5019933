use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dd_common::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// A fresh, random order id.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Order id cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order is newly created, and no payment has been confirmed.
    Pending,
    /// The payment provider confirmed the payment. Terminal.
    Paid,
    /// The payment provider reported a failed payment. Terminal.
    Failed,
    /// The payment was cancelled before completion. Terminal.
    Canceled,
}

impl OrderStatusType {
    /// Orders only ever leave `Pending`. Everything else is final.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        matches!(self, OrderStatusType::Pending) && !matches!(next, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Failed => write!(f, "failed"),
            OrderStatusType::Canceled => write!(f, "canceled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Canceled,
    /// Coinbase reports that the payment arrived late. The order remains pending.
    Delayed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Canceled => write!(f, "canceled"),
            PaymentStatus::Delayed => write!(f, "delayed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            "delayed" => Ok(Self::Delayed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentProvider     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    PayPal,
    Coinbase,
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentProvider::Stripe => write!(f, "stripe"),
            PaymentProvider::PayPal => write!(f, "paypal"),
            PaymentProvider::Coinbase => write!(f, "coinbase"),
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::PayPal),
            "coinbase" => Ok(Self::Coinbase),
            s => Err(ConversionError(format!("Unknown payment provider: {s}"))),
        }
    }
}

//--------------------------------------       LineItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The catalogue id of the product, if the storefront supplied one
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Unit price
    pub price: Money,
    pub quantity: u32,
}

impl LineItem {
    pub fn new<S: Into<String>>(name: S, price: Money, quantity: u32) -> Self {
        Self { id: None, name: name.into(), price, quantity }
    }

    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

//--------------------------------------   ShippingAddress     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    /// County or state
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

//--------------------------------------     TrackingInfo      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub tracking_status: String,
    pub estimated_delivery: Option<String>,
    pub label_url: Option<String>,
    pub packing_slip_url: Option<String>,
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub amount: Money,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub customer_email: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub discount_code: Option<String>,
    pub payment_provider: Option<PaymentProvider>,
    pub payment_id: Option<String>,
    /// The provider-side checkout, session or charge id created for this order
    pub checkout_reference: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub tracking_status: Option<String>,
    pub estimated_delivery: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    /// The order total, including shipping and after discounts
    pub amount: Money,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub customer_email: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub discount_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(items: Vec<LineItem>, amount: Money) -> Self {
        Self {
            id: OrderId::random(),
            amount,
            currency: dd_common::DEFAULT_CURRENCY_CODE.to_string(),
            items,
            customer_email: None,
            shipping_address: None,
            discount_code: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    pub fn with_shipping_address(mut self, address: ShippingAddress) -> Self {
        self.shipping_address = Some(address);
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into().to_ascii_uppercase();
        self
    }
}

//--------------------------------------       PaidOrder       ---------------------------------------------------------
/// Snapshot of an order taken when its payment was confirmed. There is at most one per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidOrder {
    pub id: i64,
    pub original_order_id: OrderId,
    pub provider: PaymentProvider,
    pub payment_id: String,
    pub capture_id: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub customer_email: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub tracking_status: Option<String>,
    pub estimated_delivery: Option<String>,
    pub label_url: Option<String>,
    pub packing_slip_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaidOrder {
    pub fn tracking(&self) -> Option<TrackingInfo> {
        self.tracking_number.as_ref().map(|n| TrackingInfo {
            tracking_number: Some(n.clone()),
            tracking_url: self.tracking_url.clone(),
            tracking_status: self.tracking_status.clone().unwrap_or_else(|| "pending".into()),
            estimated_delivery: self.estimated_delivery.clone(),
            label_url: self.label_url.clone(),
            packing_slip_url: self.packing_slip_url.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewPaidOrder {
    pub original_order_id: OrderId,
    pub provider: PaymentProvider,
    pub payment_id: String,
    pub capture_id: Option<String>,
    pub amount: Money,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub customer_email: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}

//--------------------------------------     DiscountType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage of subtotal plus shipping
    Percentage,
    /// `discount_value` is an amount in the order currency
    Fixed,
}

impl Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for DiscountType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            s => Err(ConversionError(format!("Invalid discount type: {s}"))),
        }
    }
}

//--------------------------------------     DiscountCode      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub id: i64,
    pub code: String,
    pub email: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    /// The order this code was spent on, if any
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDiscountCode {
    pub code: String,
    pub email: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub expires_at: DateTime<Utc>,
}

impl NewDiscountCode {
    pub fn percentage<S: Into<String>>(code: S, email: S, percent: Decimal, expires_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            email: email.into(),
            discount_type: DiscountType::Percentage,
            discount_value: percent,
            expires_at,
        }
    }
}
