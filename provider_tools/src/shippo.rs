use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use crate::{
    config::ShippoConfig,
    data_objects::shippo::{
        NewShipment,
        NewShippoOrder,
        NewTransaction,
        PackingSlip,
        ShippoAddress,
        ShippoObject,
        ShippoShipment,
        ShippoTransaction,
    },
    rest::{build_client, send_request},
    ProviderApiError,
};

#[derive(Clone)]
pub struct ShippoApi {
    config: ShippoConfig,
    client: Arc<Client>,
}

impl ShippoApi {
    pub fn new(config: ShippoConfig, timeout: Duration) -> Result<Self, ProviderApiError> {
        if !config.is_configured() {
            return Err(ProviderApiError::NotConfigured("Shippo"));
        }
        let mut headers = HeaderMap::with_capacity(1);
        let auth = HeaderValue::from_str(&format!("ShippoToken {}", config.api_token.reveal()))
            .map_err(|e| ProviderApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        let client = build_client(headers, timeout)?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Registers an address and returns its object id.
    pub async fn create_address(&self, address: &ShippoAddress) -> Result<String, ProviderApiError> {
        trace!("📦️ Creating Shippo address in {}", address.city);
        let req = self.client.post(self.url("/addresses/")).json(address);
        let result = send_request::<ShippoObject>(req).await?;
        Ok(result.object_id)
    }

    pub async fn create_shipment(&self, shipment: &NewShipment) -> Result<ShippoShipment, ProviderApiError> {
        trace!("📦️ Creating Shippo shipment with {} parcel(s)", shipment.parcels.len());
        let req = self.client.post(self.url("/shipments/")).json(shipment);
        send_request::<ShippoShipment>(req).await
    }

    /// Buys a label. A transaction that Shippo reports as failed is returned as an error.
    pub async fn create_transaction(&self, rate_id: &str) -> Result<ShippoTransaction, ProviderApiError> {
        let req = self.client.post(self.url("/transactions/")).json(&NewTransaction::pdf(rate_id));
        let result = send_request::<ShippoTransaction>(req).await?;
        if !result.is_success() {
            let message = format!("Transaction {} is {}. {}", result.object_id, result.status, result.error_messages());
            return Err(ProviderApiError::UnexpectedResponse(message));
        }
        Ok(result)
    }

    pub async fn create_order(&self, order: &NewShippoOrder) -> Result<String, ProviderApiError> {
        trace!("📦️ Creating Shippo order {}", order.order_number);
        let req = self.client.post(self.url("/orders/")).json(order);
        let result = send_request::<ShippoObject>(req).await?;
        Ok(result.object_id)
    }

    pub async fn packing_slip(&self, shippo_order_id: &str) -> Result<PackingSlip, ProviderApiError> {
        let path = format!("/orders/{shippo_order_id}/packingslip/");
        let req = self.client.get(self.url(&path));
        send_request::<PackingSlip>(req).await
    }
}
