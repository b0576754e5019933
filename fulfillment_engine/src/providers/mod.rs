//! # Collaborator contracts
//!
//! The fulfillment engine talks to the outside world only through the traits in this module. Concrete HTTP clients
//! live in the server crate, which binds them to these traits; tests substitute in-memory fakes.
//!
//! * [`ShippingProvider`] creates addresses, shipments, labels and packing slips.
//! * [`SubscriberProvider`] manages newsletter subscribers and sends one-off campaigns.
//! * [`PaymentGateway`] and [`PaymentVerification`] create provider-side checkouts and confirm them.
//! * [`WebhookVerifier`] authenticates incoming provider webhooks.
mod email;
mod payments;
mod shipping;
mod webhooks;

pub use email::{Campaign, NotificationError, SubscriberFields, SubscriberProvider, SubscriberUpsert};
pub use payments::{
    CheckoutSession,
    PaymentCheck,
    PaymentConfirmation,
    PaymentGateway,
    PaymentProviderError,
    PaymentVerification,
};
pub use shipping::{
    LabelPurchase,
    Parcel,
    Shipment,
    ShippingError,
    ShippingOrderRequest,
    ShippingParty,
    ShippingProvider,
    ShippingRate,
};
pub use webhooks::{AcceptAllVerifier, SignatureError, WebhookVerifier};
