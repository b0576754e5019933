use thiserror::Error;

use crate::db_types::{OrderId, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Discount code {0} cannot be applied to this order")]
    DiscountUnavailable(String),
    #[error("A stored record could not be read: {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
