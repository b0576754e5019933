use fulfillment_engine::{
    db_types::{Order, OrderId, PaymentProvider, ShippingAddress},
    providers::{
        CheckoutSession,
        PaymentCheck,
        PaymentConfirmation,
        PaymentGateway,
        PaymentProviderError,
        PaymentVerification,
    },
};
use log::*;
use provider_tools::{
    data_objects::paypal::{NewPayPalOrder, PayPalAmount, PayPalCapture},
    PayPalApi,
};

use super::payment_error;

#[derive(Clone)]
pub struct PayPalGateway {
    api: Option<PayPalApi>,
    public_base_url: String,
}

impl PayPalGateway {
    pub fn new(api: Option<PayPalApi>, public_base_url: &str) -> Self {
        Self { api, public_base_url: public_base_url.to_string() }
    }

    fn api(&self) -> Result<&PayPalApi, PaymentProviderError> {
        self.api.as_ref().ok_or(PaymentProviderError::NotConfigured(PaymentProvider::PayPal))
    }
}

impl PaymentGateway for PayPalGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::PayPal
    }

    async fn create_checkout(&self, order: &Order) -> Result<CheckoutSession, PaymentProviderError> {
        let api = self.api()?;
        let request = new_paypal_order(order, &self.public_base_url);
        let paypal_order = api.create_order(&request).await.map_err(|e| payment_error(PaymentProvider::PayPal, e))?;
        let redirect_url = paypal_order.approve_url().map(String::from);
        Ok(CheckoutSession { provider: PaymentProvider::PayPal, reference: paypal_order.id, redirect_url })
    }
}

/// Capturing is how a PayPal payment is confirmed. The customer has already approved the order in the PayPal popup.
impl PaymentVerification for PayPalGateway {
    async fn verify_payment(&self, paypal_order_id: &str) -> Result<PaymentCheck, PaymentProviderError> {
        let api = self.api()?;
        let capture =
            api.capture_order(paypal_order_id).await.map_err(|e| payment_error(PaymentProvider::PayPal, e))?;
        if !capture.is_completed() {
            warn!("💳️ PayPal order {paypal_order_id} was captured with status {}", capture.status);
            return Ok(PaymentCheck::NotPaid { status: capture.status });
        }
        confirmation_from_capture(&capture).map(PaymentCheck::Paid)
    }
}

pub fn new_paypal_order(order: &Order, base_url: &str) -> NewPayPalOrder {
    NewPayPalOrder {
        amount: PayPalAmount { currency_code: order.currency.clone(), value: order.amount.to_string() },
        description: "Dose Daily order".to_string(),
        custom_id: order.id.to_string(),
        return_url: format!("{base_url}/checkout/success?provider=paypal&order_id={}", order.id),
        cancel_url: format!("{base_url}/cart"),
    }
}

pub fn confirmation_from_capture(capture: &PayPalCapture) -> Result<PaymentConfirmation, PaymentProviderError> {
    let order_id = capture.custom_id().ok_or(PaymentProviderError::MissingOrderReference(PaymentProvider::PayPal))?;
    let email = capture.payer_email().map(String::from);
    let mut confirmation = PaymentConfirmation::new(PaymentProvider::PayPal, OrderId::from(order_id), &capture.id)
        .with_email(email)
        .with_shipping_address(shipping_address(capture));
    if let Some(capture_id) = capture.capture_id() {
        confirmation = confirmation.with_capture_id(capture_id);
    }
    Ok(confirmation)
}

/// The address the customer chose in PayPal. `None` unless it has at least a first line.
pub fn shipping_address(capture: &PayPalCapture) -> Option<ShippingAddress> {
    let shipping = capture.shipping()?;
    let address = shipping.address.as_ref()?;
    let line1 = address.address_line_1.clone().filter(|s| !s.trim().is_empty())?;
    let name = shipping
        .name
        .as_ref()
        .and_then(|n| n.full_name.clone())
        .or_else(|| capture.payer_name())
        .unwrap_or_default();
    Some(ShippingAddress {
        name,
        line1,
        line2: address.address_line_2.clone(),
        city: address.admin_area_2.clone().unwrap_or_default(),
        state: address.admin_area_1.clone(),
        postal_code: address.postal_code.clone().unwrap_or_default(),
        country: address.country_code.clone().unwrap_or_default(),
        phone: None,
        email: capture.payer_email().map(String::from),
    })
}
