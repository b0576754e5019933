use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fulfillment_engine::{
    events::{EventHandlers, EventHooks, EventProducers, OrderAnnulledEvent},
    providers::{AcceptAllVerifier, WebhookVerifier},
    CheckoutApi,
    DiscountApi,
    FulfillmentApi,
    NotificationApi,
    OrderApi,
    ShippingLabelApi,
    SqliteDatabase,
};
use log::*;
use provider_tools::{CoinbaseApi, MailerLiteApi, PayPalApi, ShippoApi, StripeApi};

use crate::{
    config::{ServerConfig, WebhookConfig},
    errors::ServerError,
    integrations::{
        coinbase::CoinbaseGateway,
        mailerlite::MailerLiteSubscribers,
        optional_client,
        paypal::PayPalGateway,
        shippo::ShippoShipping,
        stripe::StripeGateway,
    },
    routes::{
        health,
        CoinbaseCreateChargeRoute,
        CreateOrderRoute,
        FetchOrderRoute,
        MarkDiscountUsedRoute,
        PaypalCaptureRoute,
        PaypalCreateOrderRoute,
        StripeCheckoutSessionRoute,
        StripeVerifyPaymentRoute,
        ValidateDiscountRoute,
    },
    signatures::HmacVerifier,
    webhook_routes::{CoinbaseWebhookRoute, StripeWebhookRoute, WebhookVerifiers},
};

pub const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let providers = Providers::from_config(&config)?;
    let handlers = create_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, providers, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The provider clients, bound to the engine's provider traits. Cheap to clone; every worker gets its own copy.
#[derive(Clone)]
pub struct Providers {
    pub stripe: StripeGateway,
    pub paypal: PayPalGateway,
    pub coinbase: CoinbaseGateway,
    pub shipping: ShippoShipping,
    pub mailer: MailerLiteSubscribers,
    pub verifiers: WebhookVerifiers,
}

impl Providers {
    /// Missing credentials leave that provider unconfigured; its routes answer 503 until they are set.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let timeout = config.http_timeout;
        let base_url = config.public_base_url.as_str();
        let stripe = optional_client("Stripe", StripeApi::new(config.stripe.clone(), timeout))?;
        let paypal = optional_client("PayPal", PayPalApi::new(config.paypal.clone(), timeout))?;
        let coinbase = optional_client("Coinbase", CoinbaseApi::new(config.coinbase.clone(), timeout))?;
        let shippo = optional_client("Shippo", ShippoApi::new(config.shippo.clone(), timeout))?;
        let mailerlite = optional_client("MailerLite", MailerLiteApi::new(config.mailerlite.clone(), timeout))?;
        Ok(Self {
            stripe: StripeGateway::new(stripe, base_url),
            paypal: PayPalGateway::new(paypal, base_url),
            coinbase: CoinbaseGateway::new(coinbase, base_url),
            shipping: ShippoShipping::new(shippo),
            mailer: MailerLiteSubscribers::new(mailerlite),
            verifiers: webhook_verifiers(&config.webhooks),
        })
    }
}

pub fn webhook_verifiers(config: &WebhookConfig) -> WebhookVerifiers {
    if config.accept_unsigned {
        warn!("🔐️ Webhook signatures will NOT be checked");
        let accept_all: Arc<dyn WebhookVerifier> = Arc::new(AcceptAllVerifier);
        return WebhookVerifiers { stripe: Some(accept_all.clone()), coinbase: Some(accept_all) };
    }
    let stripe = (!config.stripe_secret.is_empty()).then(|| {
        let verifier = HmacVerifier::stripe(config.stripe_secret.clone(), config.stripe_tolerance);
        Arc::new(verifier) as Arc<dyn WebhookVerifier>
    });
    let coinbase = (!config.coinbase_secret.is_empty()).then(|| {
        let verifier = HmacVerifier::coinbase(config.coinbase_secret.clone());
        Arc::new(verifier) as Arc<dyn WebhookVerifier>
    });
    WebhookVerifiers { stripe, coinbase }
}

/// Hooks that run after an order is paid or annulled. They only log for now; anything slow belongs here rather than
/// in the request path.
pub fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            let tracking = ev.tracking.as_ref().and_then(|t| t.tracking_number.as_deref()).unwrap_or("none");
            info!(
                "📬️ Order {} paid via {} ({}) for {} {}. Tracking: {tracking}",
                ev.order.id, ev.provider, ev.payment_id, ev.order.amount, ev.order.currency
            );
        })
    });
    hooks.on_order_annulled(|ev| {
        Box::pin(async move {
            let OrderAnnulledEvent { order, status } = ev;
            info!("📬️ Order {} was annulled. It is now {status}", order.id);
        })
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    providers: Providers,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderApi::new(db.clone());
        let discount_api = DiscountApi::new(db.clone());
        let stripe_checkout = CheckoutApi::new(db.clone(), providers.stripe.clone());
        let paypal_checkout = CheckoutApi::new(db.clone(), providers.paypal.clone());
        let coinbase_checkout = CheckoutApi::new(db.clone(), providers.coinbase.clone());
        let shipping = ShippingLabelApi::new(providers.shipping.clone(), config.shipping.clone());
        let notifications = NotificationApi::new(providers.mailer.clone(), config.http_timeout);
        let fulfillment_api = FulfillmentApi::new(db.clone(), shipping, notifications, producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("dd::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(discount_api))
            .app_data(web::Data::new(stripe_checkout))
            .app_data(web::Data::new(paypal_checkout))
            .app_data(web::Data::new(coinbase_checkout))
            .app_data(web::Data::new(fulfillment_api))
            .app_data(web::Data::new(providers.stripe.clone()))
            .app_data(web::Data::new(providers.paypal.clone()))
            .app_data(web::Data::new(providers.verifiers.clone()))
            .service(health)
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(FetchOrderRoute::<SqliteDatabase>::new())
            .service(ValidateDiscountRoute::<SqliteDatabase>::new())
            .service(MarkDiscountUsedRoute::<SqliteDatabase>::new())
            .service(StripeCheckoutSessionRoute::<SqliteDatabase, StripeGateway>::new())
            .service(PaypalCreateOrderRoute::<SqliteDatabase, PayPalGateway>::new())
            .service(CoinbaseCreateChargeRoute::<SqliteDatabase, CoinbaseGateway>::new())
            .service(
                StripeVerifyPaymentRoute::<SqliteDatabase, ShippoShipping, MailerLiteSubscribers, StripeGateway>::new(),
            )
            .service(PaypalCaptureRoute::<SqliteDatabase, ShippoShipping, MailerLiteSubscribers, PayPalGateway>::new())
            .service(StripeWebhookRoute::<SqliteDatabase, ShippoShipping, MailerLiteSubscribers>::new())
            .service(CoinbaseWebhookRoute::<SqliteDatabase, ShippoShipping, MailerLiteSubscribers>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are answered in the same `{"error": ...}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into())
}
