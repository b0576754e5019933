use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::{
    config::PayPalConfig,
    data_objects::paypal::{AccessToken, NewPayPalOrder, PayPalCapture, PayPalOrder},
    rest::{build_client, send_request},
    ProviderApiError,
};

#[derive(Clone)]
pub struct PayPalApi {
    config: PayPalConfig,
    client: Arc<Client>,
}

impl PayPalApi {
    pub fn new(config: PayPalConfig, timeout: Duration) -> Result<Self, ProviderApiError> {
        if !config.is_configured() {
            return Err(ProviderApiError::NotConfigured("PayPal"));
        }
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = build_client(headers, timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Fetches a client-credentials token. Tokens are short-lived, so one is requested per operation.
    pub async fn access_token(&self) -> Result<String, ProviderApiError> {
        let req = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(self.config.client_id.reveal(), Some(self.config.client_secret.reveal()))
            .form(&[("grant_type", "client_credentials")]);
        let token = send_request::<AccessToken>(req).await?;
        trace!("💳️ PayPal access token obtained. Expires in {}s", token.expires_in);
        Ok(token.access_token)
    }

    pub async fn create_order(&self, order: &NewPayPalOrder) -> Result<PayPalOrder, ProviderApiError> {
        let token = self.access_token().await?;
        let amount = &order.amount;
        debug!("💳️ Creating PayPal order for {} ({} {})", order.custom_id, amount.value, amount.currency_code);
        let req = self
            .client
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .header("Prefer", "return=representation")
            .json(&order.to_json());
        let result = send_request::<PayPalOrder>(req).await?;
        info!("💳️ PayPal order {} created for {}. Status: {}", result.id, order.custom_id, result.status);
        Ok(result)
    }

    pub async fn capture_order(&self, paypal_order_id: &str) -> Result<PayPalCapture, ProviderApiError> {
        if paypal_order_id.is_empty() || !paypal_order_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ProviderApiError::RestRequestError(format!("Invalid PayPal order id: {paypal_order_id}")));
        }
        let token = self.access_token().await?;
        let path = format!("/v2/checkout/orders/{paypal_order_id}/capture");
        debug!("💳️ Capturing PayPal order {paypal_order_id}");
        let req = self
            .client
            .post(self.url(&path))
            .bearer_auth(token)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({}));
        let result = send_request::<PayPalCapture>(req).await?;
        info!("💳️ PayPal order {paypal_order_id} capture status: {}", result.status);
        Ok(result)
    }
}
