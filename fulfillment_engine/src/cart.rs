//! Cart arithmetic.
//!
//! Totals are always computed on the server from the line items, never taken from the client:
//!
//! * `subtotal = Σ(price × quantity)`
//! * `shipping = 0` when the subtotal is strictly greater than the free-shipping threshold (£75), else the flat rate
//!   (£5.99)
//! * a percentage discount takes `rate%` of `subtotal + shipping`; a fixed discount subtracts its face value
//! * `total = max(0, subtotal + shipping − discount)`
//!
//! Every figure is rounded to two decimal places.
use dd_common::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{DiscountCode, DiscountType, LineItem};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("The cart is empty")]
    Empty,
    #[error("Item '{0}' must have a quantity of at least 1")]
    InvalidQuantity(String),
    #[error("Item '{0}' has a negative price")]
    NegativePrice(String),
    #[error("Item names cannot be empty")]
    MissingName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingPolicy {
    /// Orders with a subtotal strictly above this ship for free
    pub free_shipping_over: Money,
    pub flat_rate: Money,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self { free_shipping_over: Money::new(75, 0), flat_rate: Money::new(599, 2) }
    }
}

impl ShippingPolicy {
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal > self.free_shipping_over {
            Money::zero()
        } else {
            self.flat_rate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AppliedDiscount {
    /// Percent, e.g. `10` for 10% off
    Percentage(Decimal),
    Fixed(Money),
}

impl From<&DiscountCode> for AppliedDiscount {
    fn from(code: &DiscountCode) -> Self {
        match code.discount_type {
            DiscountType::Percentage => AppliedDiscount::Percentage(code.discount_value),
            DiscountType::Fixed => AppliedDiscount::Fixed(Money::from(code.discount_value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub discount: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<LineItem>,
}

impl Cart {
    pub fn new(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    pub fn validate(&self) -> Result<(), CartError> {
        if self.items.is_empty() {
            return Err(CartError::Empty);
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(CartError::MissingName);
            }
            if item.quantity == 0 {
                return Err(CartError::InvalidQuantity(item.name.clone()));
            }
            if item.price.is_negative() {
                return Err(CartError::NegativePrice(item.name.clone()));
            }
        }
        Ok(())
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum::<Money>().rounded()
    }

    pub fn totals(&self, policy: &ShippingPolicy, discount: Option<&AppliedDiscount>) -> CartTotals {
        let subtotal = self.subtotal();
        let shipping = policy.shipping_for(subtotal).rounded();
        let gross = subtotal + shipping;
        let discount = match discount {
            Some(AppliedDiscount::Percentage(rate)) => gross.percentage(*rate).rounded(),
            Some(AppliedDiscount::Fixed(value)) => value.rounded(),
            None => Money::zero(),
        };
        let total = (gross - discount).or_zero().rounded();
        CartTotals { subtotal, shipping, discount, total }
    }
}
