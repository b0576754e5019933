use fulfillment_engine::{
    db_types::{Order, OrderId, PaymentProvider, PaymentStatus},
    providers::{CheckoutSession, PaymentConfirmation, PaymentGateway, PaymentProviderError},
};
use log::*;
use provider_tools::{
    data_objects::coinbase::{CoinbaseCharge, CoinbaseWebhook, LocalPrice, NewCharge},
    CoinbaseApi,
};

use super::{payment_error, WebhookAction};
use crate::errors::ServerError;

pub const CHARGE_CONFIRMED: &str = "charge:confirmed";
pub const CHARGE_FAILED: &str = "charge:failed";
pub const CHARGE_DELAYED: &str = "charge:delayed";

#[derive(Clone)]
pub struct CoinbaseGateway {
    api: Option<CoinbaseApi>,
    public_base_url: String,
}

impl CoinbaseGateway {
    pub fn new(api: Option<CoinbaseApi>, public_base_url: &str) -> Self {
        Self { api, public_base_url: public_base_url.to_string() }
    }
}

impl PaymentGateway for CoinbaseGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Coinbase
    }

    async fn create_checkout(&self, order: &Order) -> Result<CheckoutSession, PaymentProviderError> {
        let api = self.api.as_ref().ok_or(PaymentProviderError::NotConfigured(PaymentProvider::Coinbase))?;
        let charge = new_charge(order, &self.public_base_url);
        let charge = api.create_charge(&charge).await.map_err(|e| payment_error(PaymentProvider::Coinbase, e))?;
        Ok(CheckoutSession {
            provider: PaymentProvider::Coinbase,
            reference: charge.id,
            redirect_url: charge.hosted_url,
        })
    }
}

pub fn new_charge(order: &Order, base_url: &str) -> NewCharge {
    let price = LocalPrice { amount: order.amount.to_string(), currency: order.currency.clone() };
    let mut charge = NewCharge::fixed_price("Dose Daily order", price, order.id.as_str());
    if let Some(email) = &order.customer_email {
        charge.metadata.insert("customer_email".to_string(), email.clone());
    }
    charge.redirect_url = Some(format!("{base_url}/checkout/success?provider=coinbase&order_id={}", order.id));
    charge.cancel_url = Some(format!("{base_url}/cart"));
    charge
}

fn charge_order_id(charge: &CoinbaseCharge) -> Result<OrderId, PaymentProviderError> {
    charge.order_id().map(OrderId::from).ok_or(PaymentProviderError::MissingOrderReference(PaymentProvider::Coinbase))
}

/// Decides what a verified Coinbase Commerce event means for the order in the charge's metadata.
pub fn coinbase_webhook_action(webhook: CoinbaseWebhook) -> Result<WebhookAction, ServerError> {
    let event = webhook.event;
    trace!("💳️ Coinbase event {} is {}", event.id, event.event_type);
    let charge = event.data;
    match event.event_type.as_str() {
        CHARGE_CONFIRMED => {
            let order_id = charge_order_id(&charge)?;
            let email = charge.customer_email().map(String::from);
            let confirmation =
                PaymentConfirmation::new(PaymentProvider::Coinbase, order_id, &charge.id).with_email(email);
            Ok(WebhookAction::Confirm(confirmation))
        },
        CHARGE_FAILED => {
            let order_id = charge_order_id(&charge)?;
            Ok(WebhookAction::Record { order_id, status: PaymentStatus::Failed, payment_id: Some(charge.id) })
        },
        CHARGE_DELAYED => {
            let order_id = charge_order_id(&charge)?;
            Ok(WebhookAction::Record { order_id, status: PaymentStatus::Delayed, payment_id: Some(charge.id) })
        },
        other => Err(ServerError::UnhandledEvent(other.to_string())),
    }
}
