use crate::{DiscountManagement, OrderManagement};

/// A backend that can hold both orders and discount codes. Creating an order needs both, since a discount code is
/// checked against the store before the order is written.
pub trait OrderStore: OrderManagement + DiscountManagement {}

impl<T> OrderStore for T where T: OrderManagement + DiscountManagement {}
