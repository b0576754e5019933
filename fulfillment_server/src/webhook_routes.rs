//----------------------------------------------   Payment webhooks  ----------------------------------------------

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use fulfillment_engine::{
    providers::{ShippingProvider, SubscriberProvider, WebhookVerifier},
    FulfillmentApi,
    FulfillmentError,
    OrderManagement,
};
use log::*;
use provider_tools::data_objects::{coinbase::CoinbaseWebhook, stripe::StripeEvent};
use serde::de::DeserializeOwned;

use crate::{
    data_objects::WebhookResponse,
    errors::ServerError,
    integrations::{coinbase::coinbase_webhook_action, stripe::stripe_webhook_action, WebhookAction},
    route,
    signatures::{COINBASE_SIGNATURE_HEADER, STRIPE_SIGNATURE_HEADER},
};

/// The signature checks for each provider's webhooks. A provider without a verifier has its webhooks refused.
#[derive(Clone, Default)]
pub struct WebhookVerifiers {
    pub stripe: Option<Arc<dyn WebhookVerifier>>,
    pub coinbase: Option<Arc<dyn WebhookVerifier>>,
}

route!(stripe_webhook => Post "/webhook/stripe" impl OrderManagement, ShippingProvider, SubscriberProvider);
pub async fn stripe_webhook<B, S, N>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<FulfillmentApi<B, S, N>>,
    verifiers: web::Data<WebhookVerifiers>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    S: ShippingProvider,
    N: SubscriberProvider,
{
    trace!("💳️ Received Stripe webhook: {} bytes", body.len());
    let verifier = verifiers.stripe.as_deref().ok_or_else(|| ServerError::NotConfigured("Stripe webhooks".into()))?;
    let event = verified_body::<StripeEvent>(&req, &body, verifier, STRIPE_SIGNATURE_HEADER)?;
    info!("💳️ Stripe event {} ({})", event.id, event.event_type);
    let action = stripe_webhook_action(event)?;
    apply_webhook_action(action, api.as_ref()).await
}

route!(coinbase_webhook => Post "/webhook/coinbase" impl OrderManagement, ShippingProvider, SubscriberProvider);
pub async fn coinbase_webhook<B, S, N>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<FulfillmentApi<B, S, N>>,
    verifiers: web::Data<WebhookVerifiers>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    S: ShippingProvider,
    N: SubscriberProvider,
{
    trace!("💳️ Received Coinbase webhook: {} bytes", body.len());
    let verifier =
        verifiers.coinbase.as_deref().ok_or_else(|| ServerError::NotConfigured("Coinbase webhooks".into()))?;
    let webhook = verified_body::<CoinbaseWebhook>(&req, &body, verifier, COINBASE_SIGNATURE_HEADER)?;
    info!("💳️ Coinbase event {} ({})", webhook.event.id, webhook.event.event_type);
    let action = coinbase_webhook_action(webhook)?;
    apply_webhook_action(action, api.as_ref()).await
}

/// Checks the signature over the raw bytes, and only then parses them.
fn verified_body<T: DeserializeOwned>(
    req: &HttpRequest,
    body: &[u8],
    verifier: &dyn WebhookVerifier,
    header: &str,
) -> Result<T, ServerError> {
    let signature = req.headers().get(header).and_then(|v| v.to_str().ok());
    verifier.verify(body, signature).map_err(|e| {
        warn!("🔐️ Webhook signature check failed. {e}");
        ServerError::from(e)
    })?;
    serde_json::from_slice(body).map_err(|e| {
        warn!("💳️ Could not parse a verified webhook body. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })
}

/// Runs the action against the orchestrator.
///
/// Anything that should not be redelivered is acknowledged with a 200: repeat deliveries for a paid order and late
/// failure notices for orders that have moved on. Errors that a redelivery might fix (an unknown order, a store
/// failure) are returned so the provider tries again.
pub async fn apply_webhook_action<B, S, N>(
    action: WebhookAction,
    api: &FulfillmentApi<B, S, N>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    S: ShippingProvider,
    N: SubscriberProvider,
{
    let response = match action {
        WebhookAction::Confirm(confirmation) => {
            let order_id = confirmation.order_id.clone();
            match api.process_payment_confirmed(confirmation).await {
                Ok(result) => {
                    let message = if result.duplicate { Some("Already processed".to_string()) } else { result.notice };
                    WebhookResponse::received(Some(result.order_id), message)
                },
                Err(e @ (FulfillmentError::OrderNotPayable { .. } | FulfillmentError::PaidByDifferentPayment(_))) => {
                    warn!("💳️ Payment confirmation for order {order_id} was not applied. {e}");
                    WebhookResponse::received(Some(order_id), Some(e.to_string()))
                },
                Err(e) => return Err(e.into()),
            }
        },
        WebhookAction::Record { order_id, status, payment_id } => {
            match api.record_payment_failure(&order_id, status, payment_id.as_deref()).await {
                Ok(order) => WebhookResponse::received(Some(order.id), Some(format!("Payment {status}"))),
                Err(e @ FulfillmentError::InvalidTransition { .. }) => {
                    warn!("💳️ Payment {status} for order {order_id} was ignored. {e}");
                    WebhookResponse::received(Some(order_id), Some(e.to_string()))
                },
                Err(e) => return Err(e.into()),
            }
        },
        WebhookAction::Acknowledge(message) => {
            debug!("💳️ {message}");
            WebhookResponse::received(None, Some(message))
        },
    };
    Ok(HttpResponse::Ok().json(response))
}
