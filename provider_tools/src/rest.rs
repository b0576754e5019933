use std::time::Duration;

use log::*;
use reqwest::{header::HeaderMap, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ProviderApiError;

const MAX_ERROR_BODY: usize = 500;

pub(crate) fn build_client(headers: HeaderMap, timeout: Duration) -> Result<Client, ProviderApiError> {
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderApiError::Initialization(e.to_string()))
}

/// Sends the request and deserializes a successful response. Error responses are reduced to the provider's message.
pub(crate) async fn send_request<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ProviderApiError> {
    let response = req.send().await.map_err(response_error)?;
    let status = response.status();
    if status.is_success() {
        trace!("REST query successful. {status}");
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ProviderApiError::Timeout
            } else {
                ProviderApiError::JsonError(e.to_string())
            }
        })
    } else {
        let body = response.text().await.map_err(response_error)?;
        let message = extract_error_message(&body);
        debug!("REST query failed. {status}: {message}");
        Err(ProviderApiError::QueryError { status: status.as_u16(), message })
    }
}

fn response_error(e: reqwest::Error) -> ProviderApiError {
    if e.is_timeout() {
        ProviderApiError::Timeout
    } else if e.is_builder() {
        ProviderApiError::RestRequestError(e.to_string())
    } else {
        ProviderApiError::RestResponseError(e.to_string())
    }
}

/// Pulls a human-readable message out of a provider error body.
///
/// Understands `{"error": {"message": ..}}` (Stripe, Coinbase), `{"error": ".."}`, `{"message": ..}` (PayPal,
/// MailerLite), `{"error_description": ..}` (OAuth) and `{"detail": ..}` (Shippo). Anything else is returned as-is,
/// truncated.
pub fn extract_error_message(body: &str) -> String {
    let json = match serde_json::from_str::<Value>(body) {
        Ok(v) => v,
        Err(_) => return body.chars().take(MAX_ERROR_BODY).collect(),
    };
    let candidates = [
        &json["error"]["message"],
        &json["error"],
        &json["message"],
        &json["error_description"],
        &json["detail"],
    ];
    candidates
        .iter()
        .find_map(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| json.to_string().chars().take(MAX_ERROR_BODY).collect())
}
