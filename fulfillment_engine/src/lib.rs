//! Dose Daily fulfillment engine
//!
//! The fulfillment engine holds the provider-agnostic core of the Dose Daily storefront backend: what happens to an
//! order between "the customer has a cart" and "the parcel has a tracking number".
//!
//! The library is divided into these sections:
//! 1. The order store ([`mod@db`]). The [`OrderManagement`] and [`DiscountManagement`] traits define what a backend
//!    must provide; SQLite is the supported backend. The data types in [`db_types`] are public.
//! 2. The collaborator contracts ([`providers`]). Payment, shipping and email providers are reached only through these
//!    traits, so the engine never depends on a particular HTTP client.
//! 3. The public API (`fe_api`): order creation, checkout, discount codes, and the [`FulfillmentApi`] orchestrator
//!    that runs after a payment is confirmed.
//!
//! The engine also emits events when orders are paid or annulled. See [`events`] for how to hook into them.
mod db;
mod fe_api;

pub mod cart;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod providers;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    ClaimResult,
    DiscountManagement,
    InsertPaidOrderResult,
    OrderManagement,
    OrderStore,
    StoreError,
};
pub use fe_api::{
    checkout_api::CheckoutApi,
    discount_api::DiscountApi,
    errors::{CheckoutError, DiscountApiError, DiscountRejection, FulfillmentError, OrderApiError},
    fulfillment_api::{FulfillmentApi, FulfillmentResult, TRACKING_PENDING_NOTICE},
    notification_api::{tracking_email, NotificationApi, TRACKING_EMAIL_SUBJECT},
    order_api::OrderApi,
    order_objects::{CreatedOrder, NewOrderRequest},
    shipping_label_api::{
        select_rate,
        ShippingLabelApi,
        ShippingLabelConfig,
        DEFAULT_CALL_TIMEOUT,
        DEFAULT_CARRIER,
        DEFAULT_SERVICE_LEVEL,
    },
};
