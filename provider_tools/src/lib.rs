//! Typed REST clients for the storefront's third-party collaborators.
//!
//! Each provider gets its own `*Api` struct wrapping a shared `reqwest::Client` with the provider's auth headers and a
//! request timeout, plus the wire objects it sends and receives. Nothing here knows about orders in the store; the
//! server crate adapts these clients to the engine's provider traits.
mod coinbase;
mod config;
mod error;
mod mailerlite;
mod paypal;
mod rest;
mod shippo;
mod stripe;

pub mod data_objects;

pub use coinbase::CoinbaseApi;
pub use config::{
    CoinbaseConfig,
    MailerLiteConfig,
    PayPalConfig,
    ShippoConfig,
    StripeConfig,
    DEFAULT_HTTP_TIMEOUT,
    PAYPAL_LIVE_URL,
    PAYPAL_SANDBOX_URL,
};
pub use error::ProviderApiError;
pub use mailerlite::MailerLiteApi;
pub use paypal::PayPalApi;
pub use rest::extract_error_message;
pub use shippo::ShippoApi;
pub use stripe::StripeApi;
