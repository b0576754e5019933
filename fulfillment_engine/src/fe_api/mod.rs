//! # Fulfillment engine public API
//!
//! The `fe_api` module exposes the programmatic API of the fulfillment engine. Each API is created by supplying the
//! backends it needs, so callers can pick only the parts they use.
//!
//! * [`order_api`] opens `pending` orders from a cart, computing totals on the server.
//! * [`checkout_api`] starts a provider-side checkout for an order.
//! * [`fulfillment_api`] is the orchestrator that runs after a payment is confirmed, failed or canceled.
//! * [`shipping_label_api`] buys shipping labels and selects carrier rates.
//! * [`notification_api`] sends the tracking email.
//! * [`discount_api`] validates and redeems newsletter discount codes.
//!
//! ```rust,ignore
//! use fulfillment_engine::{OrderApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/dd_store.db", 5).await?;
//! let api = OrderApi::new(db);
//! let order = api.fetch_order(&order_id).await?;
//! ```
pub mod checkout_api;
pub mod discount_api;
pub mod errors;
pub mod fulfillment_api;
pub mod notification_api;
pub mod order_api;
pub mod order_objects;
pub mod shipping_label_api;
