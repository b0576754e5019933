use crate::{
    db::traits::{ClaimResult, InsertPaidOrderResult, StoreError},
    db_types::{
        NewOrder,
        NewPaidOrder,
        Order,
        OrderId,
        OrderStatusType,
        PaidOrder,
        PaymentProvider,
        PaymentStatus,
        TrackingInfo,
    },
};

/// The `OrderManagement` trait defines the order lifecycle operations of the order store.
///
/// Implementations must make [`claim_payment`](OrderManagement::claim_payment) and
/// [`annul_order`](OrderManagement::annul_order) atomic conditional updates, so that concurrent deliveries of the same
/// payment event cannot both succeed.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a brand-new order with status `pending`. Fails with [`StoreError::OrderAlreadyExists`] if the id is
    /// taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Records the provider-side checkout session, order or charge created for this order.
    async fn set_checkout_reference(
        &self,
        order_id: &OrderId,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<(), StoreError>;

    /// Moves the order from `pending` to `paid` in a single conditional update, recording the provider and payment id.
    ///
    /// Returns [`StoreError::OrderNotFound`] if the order does not exist.
    async fn claim_payment(
        &self,
        order_id: &OrderId,
        provider: PaymentProvider,
        payment_id: &str,
    ) -> Result<ClaimResult, StoreError>;

    /// Moves a `pending` order to `failed` or `canceled`. Any other current status is an
    /// [`StoreError::InvalidTransition`].
    async fn annul_order(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        payment_id: Option<&str>,
    ) -> Result<Order, StoreError>;

    /// Updates only the payment status of a `pending` order, e.g. when a crypto payment is delayed.
    async fn set_payment_status(&self, order_id: &OrderId, status: PaymentStatus) -> Result<Order, StoreError>;

    async fn update_order_tracking(&self, order_id: &OrderId, tracking: &TrackingInfo) -> Result<(), StoreError>;

    /// Inserts the paid-order snapshot. At most one snapshot exists per order and per `(provider, payment_id)`; a
    /// second insert returns the existing record.
    async fn insert_paid_order(&self, paid_order: NewPaidOrder) -> Result<InsertPaidOrderResult, StoreError>;

    async fn fetch_paid_order(&self, order_id: &OrderId) -> Result<Option<PaidOrder>, StoreError>;

    async fn update_paid_order_tracking(&self, order_id: &OrderId, tracking: &TrackingInfo) -> Result<(), StoreError>;
}
