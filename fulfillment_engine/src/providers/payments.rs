use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Order, OrderId, PaymentProvider, ShippingAddress};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentProviderError {
    #[error("{0} payments are not configured")]
    NotConfigured(PaymentProvider),
    #[error("{provider} returned an error ({status:?}): {message}")]
    Upstream { provider: PaymentProvider, status: Option<u16>, message: String },
    #[error("{0} returned a response that could not be understood: {1}")]
    InvalidResponse(PaymentProvider, String),
    #[error("{0} did not respond in time")]
    Timeout(PaymentProvider),
    #[error("The {0} payment does not reference an order")]
    MissingOrderReference(PaymentProvider),
    #[error("The order amount cannot be charged: {0}")]
    InvalidAmount(String),
}

/// A provider-side checkout that the customer completes on the provider's pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub provider: PaymentProvider,
    /// Stripe session id, PayPal order id or Coinbase charge id
    pub reference: String,
    /// Where to send the customer. PayPal orders are approved in the client SDK and have none.
    pub redirect_url: Option<String>,
}

/// Provider-neutral "payment confirmed" signal. Every payment path converges on this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub provider: PaymentProvider,
    pub order_id: OrderId,
    pub payment_id: String,
    pub capture_id: Option<String>,
    pub customer_email: Option<String>,
    /// Set when the provider collected the shipping address itself (PayPal)
    pub shipping_address: Option<ShippingAddress>,
}

impl PaymentConfirmation {
    pub fn new<S: Into<String>>(provider: PaymentProvider, order_id: OrderId, payment_id: S) -> Self {
        Self {
            provider,
            order_id,
            payment_id: payment_id.into(),
            capture_id: None,
            customer_email: None,
            shipping_address: None,
        }
    }

    pub fn with_capture_id<S: Into<String>>(mut self, capture_id: S) -> Self {
        self.capture_id = Some(capture_id.into());
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.customer_email = email;
        self
    }

    pub fn with_shipping_address(mut self, address: Option<ShippingAddress>) -> Self {
        self.shipping_address = address;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentCheck {
    Paid(PaymentConfirmation),
    /// The provider reports the payment as not (yet) complete, with its own status string
    NotPaid { status: String },
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    fn provider(&self) -> PaymentProvider;

    /// Creates the provider-side session, order or charge for `order`.
    async fn create_checkout(&self, order: &Order) -> Result<CheckoutSession, PaymentProviderError>;
}

/// Client-driven confirmation. For Stripe this retrieves the checkout session; for PayPal it captures the approved
/// order.
#[allow(async_fn_in_trait)]
pub trait PaymentVerification {
    async fn verify_payment(&self, reference: &str) -> Result<PaymentCheck, PaymentProviderError>;
}
