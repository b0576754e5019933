use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::{
    config::CoinbaseConfig,
    data_objects::coinbase::{ChargeResponse, CoinbaseCharge, NewCharge},
    rest::{build_client, send_request},
    ProviderApiError,
};

#[derive(Clone)]
pub struct CoinbaseApi {
    config: CoinbaseConfig,
    client: Arc<Client>,
}

impl CoinbaseApi {
    pub fn new(config: CoinbaseConfig, timeout: Duration) -> Result<Self, ProviderApiError> {
        if !config.is_configured() {
            return Err(ProviderApiError::NotConfigured("Coinbase Commerce"));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let key = HeaderValue::from_str(config.api_key.reveal())
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert("X-CC-Api-Key", key);
        let version = HeaderValue::from_str(&config.api_version)
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert("X-CC-Version", version);
        let client = build_client(headers, timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    pub async fn create_charge(&self, charge: &NewCharge) -> Result<CoinbaseCharge, ProviderApiError> {
        debug!("💳️ Creating Coinbase charge for {} {}", charge.local_price.amount, charge.local_price.currency);
        let req = self.client.post(self.url("/charges")).json(charge);
        let result = send_request::<ChargeResponse>(req).await?.data;
        if result.hosted_url.is_none() {
            return Err(ProviderApiError::UnexpectedResponse(format!("Charge {} has no hosted URL", result.id)));
        }
        info!("💳️ Coinbase charge {} created", result.id);
        Ok(result)
    }
}
