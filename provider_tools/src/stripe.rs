use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use crate::{
    config::StripeConfig,
    data_objects::stripe::{NewCheckoutSession, StripeCheckoutSession},
    rest::{build_client, send_request},
    ProviderApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig, timeout: Duration) -> Result<Self, ProviderApiError> {
        if !config.is_configured() {
            return Err(ProviderApiError::NotConfigured("Stripe"));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        let version = HeaderValue::from_str(&config.api_version)
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert("Stripe-Version", version);
        let client = build_client(headers, timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<StripeCheckoutSession, ProviderApiError> {
        let form = session.to_form();
        debug!("💳️ Creating Stripe checkout session with {} line item(s)", session.line_items.len());
        let req = self.client.post(self.url("/checkout/sessions")).form(&form);
        let result = send_request::<StripeCheckoutSession>(req).await?;
        info!("💳️ Stripe checkout session {} created", result.id);
        Ok(result)
    }

    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<StripeCheckoutSession, ProviderApiError> {
        if session_id.is_empty() || !session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ProviderApiError::RestRequestError(format!("Invalid session id: {session_id}")));
        }
        let path = format!("/checkout/sessions/{session_id}");
        trace!("💳️ Fetching Stripe checkout session {session_id}");
        let req = self.client.get(self.url(&path));
        let result = send_request::<StripeCheckoutSession>(req).await?;
        debug!("💳️ Stripe checkout session {session_id} is {}", result.payment_status);
        Ok(result)
    }
}
