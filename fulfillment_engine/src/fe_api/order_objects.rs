use serde::{Deserialize, Serialize};

use crate::{
    cart::CartTotals,
    db_types::{LineItem, Order, ShippingAddress},
};

/// What the storefront sends to open a new order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub discount_code: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub totals: CartTotals,
}
