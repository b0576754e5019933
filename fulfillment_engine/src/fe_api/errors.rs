use thiserror::Error;

use crate::{
    cart::CartError,
    db::traits::StoreError,
    db_types::{OrderId, OrderStatusType, PaymentStatus},
    providers::PaymentProviderError,
};

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} is {status} and cannot be paid")]
    OrderNotPayable { order_id: OrderId, status: OrderStatusType },
    #[error("Order {0} has already been paid by a different payment")]
    PaidByDifferentPayment(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Payment status {0} is not a failure status")]
    NotAFailureStatus(PaymentStatus),
    #[error("Order store error: {0}")]
    StoreError(StoreError),
}

impl From<StoreError> for FulfillmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => FulfillmentError::OrderNotFound(id),
            StoreError::InvalidTransition { order_id, from, to } => {
                FulfillmentError::InvalidTransition { order_id, from, to }
            },
            e => FulfillmentError::StoreError(e),
        }
    }
}

/// Why a discount code cannot be applied. The messages are shown to customers as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiscountRejection {
    #[error("Invalid discount code")]
    Invalid,
    #[error("Discount code has expired")]
    Expired,
    #[error("This discount code has already been used")]
    AlreadyUsed,
}

#[derive(Debug, Clone, Error)]
pub enum DiscountApiError {
    #[error("{0}")]
    Rejected(#[from] DiscountRejection),
    #[error("Both a discount code and an email address are required")]
    MissingFields,
    #[error("Order store error: {0}")]
    StoreError(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Invalid cart: {0}")]
    InvalidCart(#[from] CartError),
    #[error("Invalid shipping address: {0} is required")]
    InvalidAddress(&'static str),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
    #[error("{0}")]
    DiscountRejected(DiscountRejection),
    #[error("A discount code can only be used together with an email address")]
    DiscountWithoutEmail,
    #[error("Order store error: {0}")]
    StoreError(#[from] StoreError),
}

impl From<DiscountApiError> for OrderApiError {
    fn from(e: DiscountApiError) -> Self {
        match e {
            DiscountApiError::Rejected(r) => OrderApiError::DiscountRejected(r),
            DiscountApiError::MissingFields => OrderApiError::DiscountWithoutEmail,
            DiscountApiError::StoreError(e) => OrderApiError::StoreError(e),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} is {status}; only pending orders can be checked out")]
    OrderNotPending { order_id: OrderId, status: OrderStatusType },
    #[error("{0}")]
    ProviderError(#[from] PaymentProviderError),
    #[error("Order store error: {0}")]
    StoreError(#[from] StoreError),
}
