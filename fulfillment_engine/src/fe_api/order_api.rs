use std::fmt::Debug;

use log::*;

use crate::{
    cart::{AppliedDiscount, Cart, ShippingPolicy},
    db::traits::{OrderStore, StoreError},
    db_types::{NewOrder, Order, OrderId, ShippingAddress},
    fe_api::{
        discount_api::discount_for_order,
        errors::{DiscountRejection, OrderApiError},
        order_objects::{CreatedOrder, NewOrderRequest},
    },
    helpers::looks_like_email,
};

/// Opens `pending` orders from a storefront cart and serves them back for client polling.
///
/// Totals are always recomputed here from the line items. A discount code is spent on the order in the same store
/// transaction that saves it, so a code discounts at most one order.
pub struct OrderApi<B> {
    db: B,
    policy: ShippingPolicy,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi ({:?})", self.policy)
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, policy: ShippingPolicy::default() }
    }

    pub fn with_policy(mut self, policy: ShippingPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<B> OrderApi<B>
where B: OrderStore
{
    pub async fn create_order(&self, request: NewOrderRequest) -> Result<CreatedOrder, OrderApiError> {
        let NewOrderRequest { items, customer_email, shipping_address, discount_code, currency } = request;
        let cart = Cart::new(items);
        cart.validate()?;
        let customer_email = customer_email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());
        if let Some(email) = &customer_email {
            if !looks_like_email(email) {
                return Err(OrderApiError::InvalidEmail(email.clone()));
            }
        }
        if let Some(address) = &shipping_address {
            validate_address(address)?;
        }
        let discount_code = discount_code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        let applied = match &discount_code {
            Some(code) => {
                let email = customer_email.as_deref().ok_or(OrderApiError::DiscountWithoutEmail)?;
                let discount = discount_for_order(&self.db, code, email).await?;
                Some(AppliedDiscount::from(&discount))
            },
            None => None,
        };
        let totals = cart.totals(&self.policy, applied.as_ref());
        let mut order = NewOrder::new(cart.items, totals.total);
        if let Some(currency) = currency {
            let currency = currency.trim();
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(OrderApiError::InvalidCurrency(currency.to_string()));
            }
            order = order.with_currency(currency);
        }
        order.customer_email = customer_email;
        order.shipping_address = shipping_address;
        order.discount_code = discount_code;
        let order = self.db.insert_order(order).await.map_err(|e| match e {
            StoreError::DiscountUnavailable(_) => OrderApiError::DiscountRejected(DiscountRejection::AlreadyUsed),
            e => OrderApiError::StoreError(e),
        })?;
        info!(
            "🛒️ Order {} created. Subtotal {}, shipping {}, discount {}, total {} {}",
            order.id, totals.subtotal, totals.shipping, totals.discount, totals.total, order.currency
        );
        Ok(CreatedOrder { order, totals })
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderApiError> {
        let order = self.db.fetch_order(order_id).await?;
        Ok(order)
    }
}

fn validate_address(address: &ShippingAddress) -> Result<(), OrderApiError> {
    let required = [
        ("line1", &address.line1),
        ("city", &address.city),
        ("postal_code", &address.postal_code),
        ("country", &address.country),
    ];
    match required.iter().find(|(_, v)| v.trim().is_empty()) {
        Some((field, _)) => Err(OrderApiError::InvalidAddress(*field)),
        None => Ok(()),
    }
}
