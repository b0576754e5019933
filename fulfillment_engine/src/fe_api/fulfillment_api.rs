//! The fulfillment orchestrator.
//!
//! Every payment path (Stripe webhook, Stripe session verification, PayPal capture, Coinbase webhook) ends in a
//! [`PaymentConfirmation`] handed to [`FulfillmentApi::process_payment_confirmed`]. The run is:
//!
//! 1. Fetch the order. An unknown id is fatal and nothing is written.
//! 2. Claim the `pending → paid` transition in one conditional update. Failure is fatal so that webhook providers
//!    redeliver. If the order was already paid by this payment, the recorded result is returned and steps 3-5 are
//!    skipped.
//! 3. Insert the paid-order snapshot. Failures are logged.
//! 4. Buy a shipping label. Failures are logged and leave tracking empty.
//! 5. Email the tracking details. Failures are logged.
//!
//! None of steps 3-5 ever undoes the payment. Deliveries are at-least-once; side effects are at-most-once.
use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db::traits::{ClaimResult, InsertPaidOrderResult, OrderManagement},
    db_types::{
        NewPaidOrder,
        Order,
        OrderId,
        OrderStatusType,
        PaidOrder,
        PaymentStatus,
        ShippingAddress,
        TrackingInfo,
    },
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    fe_api::{errors::FulfillmentError, notification_api::NotificationApi, shipping_label_api::ShippingLabelApi},
    providers::{PaymentConfirmation, ShippingProvider, SubscriberProvider},
};

pub const TRACKING_PENDING_NOTICE: &str = "We'll email your tracking details separately";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentResult {
    pub order_id: OrderId,
    pub order: Order,
    pub tracking: Option<TrackingInfo>,
    /// Set when no tracking details could be obtained
    pub notice: Option<String>,
    /// `true` if this confirmation had already been processed
    pub duplicate: bool,
}

impl FulfillmentResult {
    fn new(order: Order, tracking: Option<TrackingInfo>, duplicate: bool) -> Self {
        let notice = match &tracking {
            Some(t) if t.tracking_number.is_some() => None,
            _ => Some(TRACKING_PENDING_NOTICE.to_string()),
        };
        Self { order_id: order.id.clone(), order, tracking, notice, duplicate }
    }
}

pub struct FulfillmentApi<B, S, N> {
    db: B,
    shipping: ShippingLabelApi<S>,
    notifications: NotificationApi<N>,
    producers: EventProducers,
}

impl<B, S, N> Debug for FulfillmentApi<B, S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentApi")
    }
}

impl<B, S, N> FulfillmentApi<B, S, N> {
    pub fn new(
        db: B,
        shipping: ShippingLabelApi<S>,
        notifications: NotificationApi<N>,
        producers: EventProducers,
    ) -> Self {
        Self { db, shipping, notifications, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, S, N> FulfillmentApi<B, S, N>
where
    B: OrderManagement,
    S: ShippingProvider,
    N: SubscriberProvider,
{
    pub async fn process_payment_confirmed(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<FulfillmentResult, FulfillmentError> {
        let order_id = confirmation.order_id.clone();
        let provider = confirmation.provider;
        debug!("🔄️ Payment {} confirmed by {provider} for order {order_id}", confirmation.payment_id);
        // Step 1
        let order = self.db.fetch_order(&order_id).await?.ok_or_else(|| {
            error!("🔄️ {provider} confirmed payment {} for unknown order {order_id}", confirmation.payment_id);
            FulfillmentError::OrderNotFound(order_id.clone())
        })?;
        trace!("🔄️ Order {order_id} is {} before the claim", order.status);
        // Step 2
        let order = match self.db.claim_payment(&order_id, provider, &confirmation.payment_id).await? {
            ClaimResult::Claimed(order) => order,
            ClaimResult::AlreadyPaid(order) => return self.replay(order, &confirmation).await,
            ClaimResult::NotClaimable(order) => {
                let payment_id = &confirmation.payment_id;
                warn!("🔄️ Payment {payment_id} arrived for order {order_id}, which is {}", order.status);
                return Err(FulfillmentError::OrderNotPayable { order_id, status: order.status });
            },
        };
        let email = order.customer_email.clone().or_else(|| confirmation.customer_email.clone());
        let address = confirmation.shipping_address.clone().or_else(|| order.shipping_address.clone());
        // Step 3
        self.save_paid_order(&order, &confirmation, email.clone(), address.clone()).await;
        // Step 4
        let tracking = match &address {
            Some(address) => match self.shipping.create_label(&order, address, email.as_deref()).await {
                Ok(tracking) => {
                    self.save_tracking(&order_id, &tracking).await;
                    Some(tracking)
                },
                Err(e) => {
                    warn!("🔄️ Shipping label for order {order_id} could not be created. {e}");
                    None
                },
            },
            None => {
                warn!("🔄️ Order {order_id} has no shipping address. Skipping the shipping label");
                None
            },
        };
        // Step 5
        match (&tracking, &email) {
            (Some(t), Some(email)) if t.tracking_number.is_some() => {
                let name = address.as_ref().map(|a| a.name.as_str());
                if let Err(e) = self.notifications.notify_shipped(email, name, &order_id, t).await {
                    warn!("🔄️ Tracking email for order {order_id} could not be sent. {e}");
                }
            },
            (Some(_), None) => warn!("🔄️ No email address for order {order_id}. Tracking email not sent"),
            _ => {},
        }
        let order = self.refreshed(order).await;
        let event = OrderPaidEvent::new(order.clone(), provider, confirmation.payment_id.clone())
            .with_tracking(tracking.clone());
        self.producers.publish_order_paid(event).await;
        info!("🔄️ Order {order_id} fulfilled. Tracking: {}", tracking.is_some());
        Ok(FulfillmentResult::new(order, tracking, false))
    }

    /// Records a failed, canceled or delayed payment against a `pending` order.
    ///
    /// `failed` and `canceled` end the order; `delayed` only updates its payment status. A paid order is never
    /// changed and yields [`FulfillmentError::InvalidTransition`].
    pub async fn record_payment_failure(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        payment_id: Option<&str>,
    ) -> Result<Order, FulfillmentError> {
        let order = match status {
            PaymentStatus::Failed => self.db.annul_order(order_id, OrderStatusType::Failed, payment_id).await?,
            PaymentStatus::Canceled => self.db.annul_order(order_id, OrderStatusType::Canceled, payment_id).await?,
            PaymentStatus::Delayed => self.db.set_payment_status(order_id, PaymentStatus::Delayed).await?,
            other => return Err(FulfillmentError::NotAFailureStatus(other)),
        };
        info!("🔄️ Order {order_id} recorded as {} / payment {}", order.status, order.payment_status);
        if matches!(order.status, OrderStatusType::Failed | OrderStatusType::Canceled) {
            self.producers.publish_order_annulled(OrderAnnulledEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// Builds the result of an earlier run for a repeated confirmation, without any side effects.
    async fn replay(
        &self,
        order: Order,
        confirmation: &PaymentConfirmation,
    ) -> Result<FulfillmentResult, FulfillmentError> {
        if order.payment_id.as_deref() != Some(confirmation.payment_id.as_str()) {
            warn!(
                "🔄️ Order {} is already paid by {:?}, but {} claims payment {}",
                order.id, order.payment_id, confirmation.provider, confirmation.payment_id
            );
            return Err(FulfillmentError::PaidByDifferentPayment(order.id));
        }
        info!("🔄️ Duplicate confirmation for order {}. Returning the recorded result", order.id);
        let paid = match self.db.fetch_paid_order(&order.id).await {
            Ok(p) => p,
            Err(e) => {
                warn!("🔄️ Could not fetch the paid order for {}. {e}", order.id);
                None
            },
        };
        let tracking = paid.as_ref().and_then(PaidOrder::tracking).or_else(|| tracking_from_order(&order));
        if let Some(gap) = unfinished_fulfillment(paid.as_ref(), tracking.as_ref()) {
            warn!("🔄️ Order {} is paid but {gap}. It will not be retried and needs manual repair", order.id);
        }
        Ok(FulfillmentResult::new(order, tracking, true))
    }

    async fn save_paid_order(
        &self,
        order: &Order,
        confirmation: &PaymentConfirmation,
        email: Option<String>,
        address: Option<ShippingAddress>,
    ) {
        let paid_order = NewPaidOrder {
            original_order_id: order.id.clone(),
            provider: confirmation.provider,
            payment_id: confirmation.payment_id.clone(),
            capture_id: confirmation.capture_id.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
            items: order.items.clone(),
            customer_email: email,
            shipping_address: address,
        };
        match self.db.insert_paid_order(paid_order).await {
            Ok(InsertPaidOrderResult::Inserted(p)) => debug!("🔄️ Paid order #{} saved for {}", p.id, order.id),
            Ok(InsertPaidOrderResult::AlreadyExists(p)) => {
                warn!("🔄️ A paid order (#{}) already existed for {}", p.id, order.id)
            },
            Err(e) => error!("🔄️ Could not save the paid order for {}. {e}", order.id),
        }
    }

    async fn save_tracking(&self, order_id: &OrderId, tracking: &TrackingInfo) {
        if let Err(e) = self.db.update_paid_order_tracking(order_id, tracking).await {
            warn!("🔄️ Could not store tracking details on the paid order for {order_id}. {e}");
        }
        if let Err(e) = self.db.update_order_tracking(order_id, tracking).await {
            warn!("🔄️ Could not store tracking details on order {order_id}. {e}");
        }
    }

    async fn refreshed(&self, order: Order) -> Order {
        match self.db.fetch_order(&order.id).await {
            Ok(Some(o)) => o,
            _ => order,
        }
    }
}

fn tracking_from_order(order: &Order) -> Option<TrackingInfo> {
    order.tracking_number.as_ref().map(|n| TrackingInfo {
        tracking_number: Some(n.clone()),
        tracking_url: order.tracking_url.clone(),
        tracking_status: order.tracking_status.clone().unwrap_or_else(|| "pending".to_string()),
        estimated_delivery: order.estimated_delivery.clone(),
        label_url: None,
        packing_slip_url: None,
    })
}

/// What a paid order is missing if its first fulfillment run stopped after the claim.
fn unfinished_fulfillment(paid: Option<&PaidOrder>, tracking: Option<&TrackingInfo>) -> Option<&'static str> {
    match (paid, tracking) {
        (None, None) => Some("has no paid order record and no tracking"),
        (None, Some(_)) => Some("has no paid order record"),
        (Some(_), None) => Some("has no tracking"),
        (Some(_), Some(_)) => None,
    }
}
