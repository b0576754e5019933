//! The shipping label step.
//!
//! Registers both addresses, creates a shipment with one placeholder parcel per line item, picks a rate, buys a PDF
//! label and optionally creates a provider-side order with a packing slip. Every provider call is bounded by
//! [`ShippingLabelConfig::call_timeout`]; a timeout is reported as [`ShippingError::Timeout`] like any other failure.
use std::{future::Future, time::Duration};

use log::*;

use crate::{
    db_types::{Order, ShippingAddress, TrackingInfo},
    providers::{
        LabelPurchase,
        Parcel,
        ShippingError,
        ShippingOrderRequest,
        ShippingParty,
        ShippingProvider,
        ShippingRate,
    },
};

pub const DEFAULT_CARRIER: &str = "Hermes UK";
pub const DEFAULT_SERVICE_LEVEL: &str = "hermes_uk_parcelshop_dropoff";
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ShippingLabelConfig {
    pub origin: ShippingParty,
    pub carrier: String,
    pub service_level: String,
    pub create_packing_slips: bool,
    pub call_timeout: Duration,
}

impl Default for ShippingLabelConfig {
    fn default() -> Self {
        Self {
            origin: ShippingParty::origin(),
            carrier: DEFAULT_CARRIER.to_string(),
            service_level: DEFAULT_SERVICE_LEVEL.to_string(),
            create_packing_slips: true,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Picks the rate to buy: the exact carrier and service level if offered, else any rate from the carrier, else the
/// first rate returned.
pub fn select_rate<'a>(rates: &'a [ShippingRate], carrier: &str, service_level: &str) -> Option<&'a ShippingRate> {
    rates
        .iter()
        .find(|r| r.provider == carrier && r.servicelevel_token == service_level)
        .or_else(|| rates.iter().find(|r| r.provider == carrier))
        .or_else(|| rates.first())
}

pub struct ShippingLabelApi<S> {
    provider: S,
    config: ShippingLabelConfig,
}

impl<S> ShippingLabelApi<S> {
    pub fn new(provider: S, config: ShippingLabelConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ShippingLabelConfig {
        &self.config
    }
}

impl<S> ShippingLabelApi<S>
where S: ShippingProvider
{
    /// Buys a label for `order`, shipping to `address`. Returns the tracking details on success.
    pub async fn create_label(
        &self,
        order: &Order,
        address: &ShippingAddress,
        email: Option<&str>,
    ) -> Result<TrackingInfo, ShippingError> {
        let to = ShippingParty::from_customer(address, email)?;
        let from = &self.config.origin;
        let from_id = self
            .timed(self.provider.create_address(from))
            .await
            .map_err(|e| address_error("sender", e))?;
        let to_id = self
            .timed(self.provider.create_address(&to))
            .await
            .map_err(|e| address_error("recipient", e))?;
        trace!("📦️ Addresses registered for order {}: {from_id} -> {to_id}", order.id);

        let parcels = Parcel::for_items(&order.items);
        let shipment = self.timed(self.provider.create_shipment(&from_id, &to_id, &parcels)).await?;
        debug!("📦️ Shipment {} for order {} has {} rate(s)", shipment.object_id, order.id, shipment.rates.len());
        let rate = select_rate(&shipment.rates, &self.config.carrier, &self.config.service_level)
            .ok_or(ShippingError::NoRates)?;
        info!(
            "📦️ Selected {} / {} at {} {} for order {}",
            rate.provider, rate.servicelevel_token, rate.amount, rate.currency, order.id
        );

        let label = self.timed(self.provider.create_transaction(&rate.object_id)).await?;
        let mut tracking = tracking_from_label(label);
        info!(
            "📦️ Label purchased for order {}. Tracking number: {}",
            order.id,
            tracking.tracking_number.as_deref().unwrap_or("(none)")
        );

        if self.config.create_packing_slips {
            match self.packing_slip(order, &to, parcels.len()).await {
                Ok(url) => tracking.packing_slip_url = Some(url),
                Err(e) => warn!("📦️ Could not create a packing slip for order {}. {e}", order.id),
            }
        }
        Ok(tracking)
    }

    async fn packing_slip(&self, order: &Order, to: &ShippingParty, parcels: usize) -> Result<String, ShippingError> {
        let request = ShippingOrderRequest {
            order_number: order.id.to_string(),
            to: to.clone(),
            from: self.config.origin.clone(),
            items: order.items.clone(),
            placed_at: order.created_at,
            total_price: order.amount,
            currency: order.currency.clone(),
            weight_kg: parcels as u32,
        };
        let shipping_order_id = self.timed(self.provider.create_order(&request)).await?;
        self.timed(self.provider.packing_slip(&shipping_order_id)).await
    }

    async fn timed<T, F>(&self, call: F) -> Result<T, ShippingError>
    where F: Future<Output = Result<T, ShippingError>> {
        tokio::time::timeout(self.config.call_timeout, call).await.map_err(|_| ShippingError::Timeout)?
    }
}

fn address_error(which: &str, e: ShippingError) -> ShippingError {
    match e {
        ShippingError::Timeout => ShippingError::Timeout,
        e => ShippingError::AddressRejected(which.to_string(), e.to_string()),
    }
}

fn tracking_from_label(label: LabelPurchase) -> TrackingInfo {
    TrackingInfo {
        tracking_number: label.tracking_number.filter(|s| !s.is_empty()),
        tracking_url: label.tracking_url.filter(|s| !s.is_empty()),
        tracking_status: label.tracking_status.filter(|s| !s.is_empty()).unwrap_or_else(|| "pending".to_string()),
        estimated_delivery: label.eta,
        label_url: label.label_url,
        packing_slip_url: None,
    }
}
