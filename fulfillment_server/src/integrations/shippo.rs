use fulfillment_engine::providers::{
    LabelPurchase,
    Parcel,
    Shipment,
    ShippingError,
    ShippingOrderRequest,
    ShippingParty,
    ShippingProvider,
    ShippingRate,
};
use provider_tools::{
    data_objects::shippo::{
        NewShipment,
        NewShippoOrder,
        ShippoAddress,
        ShippoLineItem,
        ShippoParcel,
        ShippoShipment,
        ShippoTransaction,
    },
    ProviderApiError,
    ShippoApi,
};

/// Shippo has no per-item weights, so every item is declared at this weight.
const ITEM_WEIGHT_KG: u32 = 1;

#[derive(Clone)]
pub struct ShippoShipping {
    api: Option<ShippoApi>,
}

impl ShippoShipping {
    pub fn new(api: Option<ShippoApi>) -> Self {
        Self { api }
    }

    fn api(&self) -> Result<&ShippoApi, ShippingError> {
        self.api.as_ref().ok_or(ShippingError::NotConfigured)
    }
}

impl ShippingProvider for ShippoShipping {
    async fn create_address(&self, party: &ShippingParty) -> Result<String, ShippingError> {
        self.api()?.create_address(&shippo_address(party)).await.map_err(shipping_error)
    }

    async fn create_shipment(
        &self,
        from_address_id: &str,
        to_address_id: &str,
        parcels: &[Parcel],
    ) -> Result<Shipment, ShippingError> {
        let request = NewShipment {
            address_from: from_address_id.to_string(),
            address_to: to_address_id.to_string(),
            parcels: parcels
                .iter()
                .map(|p| ShippoParcel::metric(p.length_cm, p.width_cm, p.height_cm, p.weight_kg))
                .collect(),
            is_async: false,
        };
        let shipment = self.api()?.create_shipment(&request).await.map_err(shipping_error)?;
        Ok(shipment_from_shippo(shipment))
    }

    async fn create_transaction(&self, rate_id: &str) -> Result<LabelPurchase, ShippingError> {
        let transaction = self.api()?.create_transaction(rate_id).await.map_err(|e| match e {
            ProviderApiError::UnexpectedResponse(msg) => ShippingError::LabelFailed(msg),
            e => shipping_error(e),
        })?;
        Ok(label_from_transaction(transaction))
    }

    async fn create_order(&self, order: &ShippingOrderRequest) -> Result<String, ShippingError> {
        self.api()?.create_order(&shippo_order(order)).await.map_err(shipping_error)
    }

    async fn packing_slip(&self, shipping_order_id: &str) -> Result<String, ShippingError> {
        let slip = self.api()?.packing_slip(shipping_order_id).await.map_err(shipping_error)?;
        Ok(slip.slip_url)
    }
}

fn shipping_error(e: ProviderApiError) -> ShippingError {
    match e {
        ProviderApiError::Timeout => ShippingError::Timeout,
        ProviderApiError::NotConfigured(_) => ShippingError::NotConfigured,
        e => ShippingError::ProviderError(e.to_string()),
    }
}

pub fn shippo_address(party: &ShippingParty) -> ShippoAddress {
    ShippoAddress {
        name: party.name.clone(),
        company: party.company.clone(),
        street1: party.street1.clone(),
        street2: party.street2.clone(),
        city: party.city.clone(),
        state: party.state.clone(),
        zip: party.zip.clone(),
        country: party.country.clone(),
        phone: party.phone.clone(),
        email: party.email.clone(),
        is_residential: party.is_residential,
    }
}

fn shipment_from_shippo(shipment: ShippoShipment) -> Shipment {
    let rates = shipment
        .rates
        .into_iter()
        .map(|r| ShippingRate {
            object_id: r.object_id,
            provider: r.provider,
            servicelevel_token: r.servicelevel.token,
            servicelevel_name: r.servicelevel.name,
            amount: r.amount,
            currency: r.currency,
        })
        .collect();
    Shipment { object_id: shipment.object_id, rates }
}

fn label_from_transaction(tx: ShippoTransaction) -> LabelPurchase {
    let tracking_status = tx.tracking_status();
    LabelPurchase {
        object_id: tx.object_id,
        tracking_number: tx.tracking_number,
        tracking_url: tx.tracking_url_provider.filter(|s| !s.is_empty()),
        tracking_status,
        eta: tx.eta,
        label_url: tx.label_url,
    }
}

pub fn shippo_order(order: &ShippingOrderRequest) -> NewShippoOrder {
    let line_items = order
        .items
        .iter()
        .map(|item| ShippoLineItem {
            title: item.name.clone(),
            quantity: item.quantity,
            total_price: item.line_total().to_string(),
            currency: order.currency.clone(),
            weight: (ITEM_WEIGHT_KG * item.quantity).to_string(),
            weight_unit: "kg".to_string(),
        })
        .collect();
    NewShippoOrder {
        to_address: shippo_address(&order.to),
        from_address: shippo_address(&order.from),
        line_items,
        placed_at: order.placed_at.to_rfc3339(),
        order_number: order.order_number.clone(),
        order_status: "PAID".to_string(),
        total_price: order.total_price.to_string(),
        currency: order.currency.clone(),
        weight: order.weight_kg.to_string(),
        weight_unit: "kg".to_string(),
        notes: format!("Dose Daily order {}", order.order_number),
    }
}
