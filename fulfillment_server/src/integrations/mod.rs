//! Bindings from the `provider_tools` REST clients to the fulfillment engine's provider traits.
//!
//! A provider whose credentials are missing still gets an adapter. Every call through it fails with the matching
//! "not configured" error, which the routes report as `503 Service Unavailable`.
use fulfillment_engine::{
    db_types::{OrderId, PaymentProvider, PaymentStatus},
    providers::{PaymentConfirmation, PaymentProviderError},
};
use log::*;
use provider_tools::ProviderApiError;

use crate::errors::ServerError;

pub mod coinbase;
pub mod mailerlite;
pub mod paypal;
pub mod shippo;
pub mod stripe;

/// What a verified webhook delivery asks the fulfillment engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    Confirm(PaymentConfirmation),
    Record { order_id: OrderId, status: PaymentStatus, payment_id: Option<String> },
    /// Nothing to do, but the delivery should be acknowledged
    Acknowledge(String),
}

/// Turns a client construction result into an optional client. Missing credentials are not an error at startup.
pub fn optional_client<T>(name: &str, client: Result<T, ProviderApiError>) -> Result<Option<T>, ServerError> {
    match client {
        Ok(c) => {
            info!("🪛️ {name} client is configured");
            Ok(Some(c))
        },
        Err(ProviderApiError::NotConfigured(_)) => {
            warn!("🪛️ {name} credentials are missing. {name} calls will fail until they are set.");
            Ok(None)
        },
        Err(e) => Err(ServerError::InitializeError(format!("{name} client: {e}"))),
    }
}

pub fn payment_error(provider: PaymentProvider, e: ProviderApiError) -> PaymentProviderError {
    match e {
        ProviderApiError::NotConfigured(_) => PaymentProviderError::NotConfigured(provider),
        ProviderApiError::Timeout => PaymentProviderError::Timeout(provider),
        ProviderApiError::QueryError { status, message } => {
            PaymentProviderError::Upstream { provider, status: Some(status), message }
        },
        // Rejected before it was sent
        ProviderApiError::RestRequestError(message) => {
            PaymentProviderError::Upstream { provider, status: Some(400), message }
        },
        ProviderApiError::JsonError(s)
        | ProviderApiError::RestResponseError(s)
        | ProviderApiError::UnexpectedResponse(s) => PaymentProviderError::InvalidResponse(provider, s),
        ProviderApiError::Initialization(message) => PaymentProviderError::Upstream { provider, status: None, message },
    }
}
