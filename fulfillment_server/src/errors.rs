use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use fulfillment_engine::{
    providers::{PaymentProviderError, SignatureError},
    CheckoutError,
    DiscountApiError,
    FulfillmentError,
    OrderApiError,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid webhook signature. {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("Unhandled event type: {0}")]
    UnhandledEvent(String),
    #[error("{message}")]
    UpstreamError { status: Option<u16>, message: String },
    #[error("The payment provider did not respond in time")]
    UpstreamTimeout,
    #[error("{0}")]
    Conflict(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidSignature(SignatureError::Missing) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(SignatureError::Malformed(_)) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            Self::UnhandledEvent(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamError { status, .. } => upstream_status(*status),
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {status}: {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

/// Client errors reported by a provider are passed through. Anything else is a bad gateway.
fn upstream_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() && *s != StatusCode::UNAUTHORIZED && *s != StatusCode::FORBIDDEN)
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::StoreError(e) => Self::BackendError(e.to_string()),
            e => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<DiscountApiError> for ServerError {
    fn from(e: DiscountApiError) -> Self {
        match e {
            DiscountApiError::StoreError(e) => Self::BackendError(e.to_string()),
            e => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<PaymentProviderError> for ServerError {
    fn from(e: PaymentProviderError) -> Self {
        match e {
            PaymentProviderError::NotConfigured(provider) => Self::NotConfigured(format!("{provider} payments")),
            PaymentProviderError::Upstream { status, message, .. } => Self::UpstreamError { status, message },
            PaymentProviderError::InvalidResponse(..) => Self::UpstreamError { status: None, message: e.to_string() },
            PaymentProviderError::Timeout(_) => Self::UpstreamTimeout,
            PaymentProviderError::MissingOrderReference(_) => Self::ValidationError(e.to_string()),
            PaymentProviderError::InvalidAmount(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist")),
            CheckoutError::OrderNotPending { .. } => Self::ValidationError(e.to_string()),
            CheckoutError::ProviderError(e) => e.into(),
            CheckoutError::StoreError(e) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<FulfillmentError> for ServerError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist")),
            FulfillmentError::OrderNotPayable { .. } => Self::Conflict(e.to_string()),
            FulfillmentError::PaidByDifferentPayment(_) => Self::Conflict(e.to_string()),
            FulfillmentError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
            FulfillmentError::NotAFailureStatus(_) => Self::ValidationError(e.to_string()),
            FulfillmentError::StoreError(e) => Self::BackendError(e.to_string()),
        }
    }
}
