//! #  Order store contracts.
//!
//! This module defines the behaviour a persistence backend must expose in order to back the fulfillment engine.
//!
//! * [`OrderManagement`] covers the order lifecycle: creating orders, claiming the `pending → paid` transition,
//!   annulling orders, the paid-order snapshot and tracking updates.
//! * [`DiscountManagement`] covers newsletter discount codes and their single-use redemption.
//! * [`OrderStore`] is shorthand for a backend that does both.
//!
//! Both traits report failures with [`StoreError`] so that the engine APIs do not depend on a specific backend.
mod data_objects;
mod discount_management;
mod order_management;
mod order_store;
mod store_error;

pub use data_objects::{ClaimResult, InsertPaidOrderResult};
pub use discount_management::DiscountManagement;
pub use order_management::OrderManagement;
pub use order_store::OrderStore;
pub use store_error::StoreError;
