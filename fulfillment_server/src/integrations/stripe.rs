use std::collections::BTreeMap;

use dd_common::Money;
use fulfillment_engine::{
    db_types::{Order, OrderId, PaymentProvider, PaymentStatus},
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
    data_objects::stripe::{
        NewCheckoutSession,
        StripeCheckoutSession,
        StripeEvent,
        StripeLineItem,
        StripePaymentIntent,
    },
    StripeApi,
};

use super::{payment_error, WebhookAction};
use crate::errors::ServerError;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";
pub const PAYMENT_INTENT_CANCELED: &str = "payment_intent.canceled";

#[derive(Clone)]
pub struct StripeGateway {
    api: Option<StripeApi>,
    public_base_url: String,
}

impl StripeGateway {
    pub fn new(api: Option<StripeApi>, public_base_url: &str) -> Self {
        Self { api, public_base_url: public_base_url.to_string() }
    }

    fn api(&self) -> Result<&StripeApi, PaymentProviderError> {
        self.api.as_ref().ok_or(PaymentProviderError::NotConfigured(PaymentProvider::Stripe))
    }
}

impl PaymentGateway for StripeGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Stripe
    }

    async fn create_checkout(&self, order: &Order) -> Result<CheckoutSession, PaymentProviderError> {
        let api = self.api()?;
        let request = new_checkout_session(order, &self.public_base_url)?;
        let session = api
            .create_checkout_session(&request)
            .await
            .map_err(|e| payment_error(PaymentProvider::Stripe, e))?;
        Ok(CheckoutSession { provider: PaymentProvider::Stripe, reference: session.id, redirect_url: session.url })
    }
}

impl PaymentVerification for StripeGateway {
    async fn verify_payment(&self, session_id: &str) -> Result<PaymentCheck, PaymentProviderError> {
        let api = self.api()?;
        let session = api
            .retrieve_checkout_session(session_id)
            .await
            .map_err(|e| payment_error(PaymentProvider::Stripe, e))?;
        if !session.is_paid() {
            debug!("💳️ Stripe session {session_id} is not paid yet ({})", session.payment_status);
            return Ok(PaymentCheck::NotPaid { status: session.payment_status });
        }
        confirmation_from_session(&session).map(PaymentCheck::Paid)
    }
}

pub fn new_checkout_session(order: &Order, base_url: &str) -> Result<NewCheckoutSession, PaymentProviderError> {
    let metadata = BTreeMap::from([("order_id".to_string(), order.id.to_string())]);
    Ok(NewCheckoutSession {
        line_items: stripe_line_items(order)?,
        currency: order.currency.clone(),
        success_url: format!("{base_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{base_url}/cart"),
        customer_email: order.customer_email.clone(),
        client_reference_id: Some(order.id.to_string()),
        metadata,
    })
}

/// The order's items, plus a shipping line if the total includes shipping. Stripe has no negative line items, so a
/// discounted order is charged as a single line for its total.
pub fn stripe_line_items(order: &Order) -> Result<Vec<StripeLineItem>, PaymentProviderError> {
    let subtotal = order.items.iter().map(|i| i.line_total()).sum::<Money>();
    let extra = order.amount - subtotal;
    if extra.is_negative() || order.items.is_empty() {
        return Ok(vec![StripeLineItem {
            name: format!("Dose Daily order {}", order.id),
            unit_amount: minor_units(order.amount)?,
            quantity: 1,
        }]);
    }
    let mut items = order
        .items
        .iter()
        .map(|item| {
            let unit_amount = minor_units(item.price)?;
            Ok(StripeLineItem { name: item.name.clone(), unit_amount, quantity: item.quantity })
        })
        .collect::<Result<Vec<_>, PaymentProviderError>>()?;
    if extra > Money::zero() {
        items.push(StripeLineItem { name: "Shipping".to_string(), unit_amount: minor_units(extra)?, quantity: 1 });
    }
    Ok(items)
}

fn minor_units(amount: Money) -> Result<i64, PaymentProviderError> {
    amount.to_minor_units().map_err(|e| PaymentProviderError::InvalidAmount(e.to_string()))
}

pub fn confirmation_from_session(session: &StripeCheckoutSession) -> Result<PaymentConfirmation, PaymentProviderError> {
    let order_id = session.order_id().ok_or(PaymentProviderError::MissingOrderReference(PaymentProvider::Stripe))?;
    let confirmation = PaymentConfirmation::new(PaymentProvider::Stripe, OrderId::from(order_id), session.payment_id())
        .with_email(session.email().map(String::from));
    Ok(confirmation)
}

/// Decides what a verified Stripe event means for the order it references.
pub fn stripe_webhook_action(event: StripeEvent) -> Result<WebhookAction, ServerError> {
    trace!("💳️ Stripe event {} is {}", event.id, event.event_type);
    match event.event_type.as_str() {
        CHECKOUT_SESSION_COMPLETED => {
            let session = serde_json::from_value::<StripeCheckoutSession>(event.data.object)
                .map_err(|e| ServerError::InvalidRequestBody(format!("Invalid checkout session. {e}")))?;
            if !session.is_paid() {
                let msg = format!("Checkout session {} completed but is {}", session.id, session.payment_status);
                return Ok(WebhookAction::Acknowledge(msg));
            }
            Ok(WebhookAction::Confirm(confirmation_from_session(&session)?))
        },
        PAYMENT_INTENT_FAILED | PAYMENT_INTENT_CANCELED => {
            let intent = serde_json::from_value::<StripePaymentIntent>(event.data.object)
                .map_err(|e| ServerError::InvalidRequestBody(format!("Invalid payment intent. {e}")))?;
            let order_id = intent
                .order_id()
                .map(OrderId::from)
                .ok_or(PaymentProviderError::MissingOrderReference(PaymentProvider::Stripe))?;
            let status =
                if event.event_type == PAYMENT_INTENT_FAILED { PaymentStatus::Failed } else { PaymentStatus::Canceled };
            Ok(WebhookAction::Record { order_id, status, payment_id: Some(intent.id) })
        },
        other => Err(ServerError::UnhandledEvent(other.to_string())),
    }
}
