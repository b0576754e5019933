use log::*;

use crate::{
    db::traits::OrderManagement,
    db_types::{OrderId, OrderStatusType},
    fe_api::errors::CheckoutError,
    providers::{CheckoutSession, PaymentGateway},
};

/// Starts a provider-side checkout for a stored `pending` order and records the provider's reference on the order.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway }
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    pub async fn start_checkout(&self, order_id: &OrderId) -> Result<CheckoutSession, CheckoutError> {
        let provider = self.gateway.provider();
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| CheckoutError::OrderNotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Pending {
            return Err(CheckoutError::OrderNotPending { order_id: order.id, status: order.status });
        }
        let session = self.gateway.create_checkout(&order).await?;
        info!("💳️ {provider} checkout {} created for order {order_id}", session.reference);
        if let Err(e) = self.db.set_checkout_reference(order_id, provider, &session.reference).await {
            // The customer can still pay; confirmation carries the order id in the provider metadata
            warn!("💳️ Could not record the {provider} reference for order {order_id}. {e}");
        }
        Ok(session)
    }
}
