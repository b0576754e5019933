use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, PaymentProvider, TrackingInfo};

/// Emitted once per order, by the caller that won the `pending → paid` claim, after the fulfillment steps have run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub provider: PaymentProvider,
    pub payment_id: String,
    pub tracking: Option<TrackingInfo>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, provider: PaymentProvider, payment_id: String) -> Self {
        Self { order, provider, payment_id, tracking: None }
    }

    pub fn with_tracking(mut self, tracking: Option<TrackingInfo>) -> Self {
        self.tracking = tracking;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}
