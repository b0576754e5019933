use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use dd_common::Secret;
use fulfillment_engine::{
    db_types::{OrderId, OrderStatusType, PaymentStatus},
    providers::WebhookVerifier,
    test_utils::fakes::{FakeMailer, FakeShipping, ShippingBehaviour},
    OrderManagement,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::{fulfillment_api, pending_order, post_request, tear_down, test_db};
use crate::{
    signatures::{sign_hex, stripe_signature_header, HmacVerifier, COINBASE_SIGNATURE_HEADER, STRIPE_SIGNATURE_HEADER},
    webhook_routes::{CoinbaseWebhookRoute, StripeWebhookRoute, WebhookVerifiers},
};

const STRIPE_SECRET: &str = "whsec_endpoint_tests";
const COINBASE_SECRET: &str = "coinbase_endpoint_tests";

struct Harness {
    db: SqliteDatabase,
    shipping: FakeShipping,
    mailer: FakeMailer,
}

impl Harness {
    async fn new() -> Self {
        let db = test_db().await;
        Self { db, shipping: FakeShipping::new(ShippingBehaviour::Succeed), mailer: FakeMailer::default() }
    }

    fn configure(&self, verifiers: WebhookVerifiers) -> impl FnOnce(&mut ServiceConfig) {
        let api = fulfillment_api(&self.db, &self.shipping, &self.mailer);
        move |cfg: &mut ServiceConfig| {
            cfg.app_data(web::Data::new(api))
                .app_data(web::Data::new(verifiers))
                .service(StripeWebhookRoute::<SqliteDatabase, FakeShipping, FakeMailer>::new())
                .service(CoinbaseWebhookRoute::<SqliteDatabase, FakeShipping, FakeMailer>::new());
        }
    }

    async fn stripe(&self, body: &str, signature: Option<&str>) -> (StatusCode, String) {
        let headers = signature.map(|s| vec![(STRIPE_SIGNATURE_HEADER, s)]).unwrap_or_default();
        post_request("/webhook/stripe", body, &headers, self.configure(verifiers())).await.expect("Request failed")
    }

    async fn coinbase(&self, body: &str, signature: Option<&str>) -> (StatusCode, String) {
        let headers = signature.map(|s| vec![(COINBASE_SIGNATURE_HEADER, s)]).unwrap_or_default();
        post_request("/webhook/coinbase", body, &headers, self.configure(verifiers())).await.expect("Request failed")
    }

    async fn order_status(&self, order_id: &OrderId) -> (OrderStatusType, PaymentStatus) {
        let order = self.db.fetch_order(order_id).await.unwrap().expect("Order not found");
        (order.status, order.payment_status)
    }
}

fn verifiers() -> WebhookVerifiers {
    let stripe = HmacVerifier::stripe(Secret::new(STRIPE_SECRET.into()), Duration::from_secs(300));
    let coinbase = HmacVerifier::coinbase(Secret::new(COINBASE_SECRET.into()));
    WebhookVerifiers {
        stripe: Some(Arc::new(stripe) as Arc<dyn WebhookVerifier>),
        coinbase: Some(Arc::new(coinbase) as Arc<dyn WebhookVerifier>),
    }
}

fn stripe_signature(body: &str) -> String {
    stripe_signature_header(STRIPE_SECRET, body.as_bytes(), Utc::now().timestamp())
}

fn session_completed(order_id: &OrderId) -> String {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": "cs_test_1",
            "payment_status": "paid",
            "payment_intent": "pi_1",
            "metadata": {"order_id": order_id},
            "customer_details": {"email": "jo@example.com"}
        }}
    })
    .to_string()
}

fn payment_failed(order_id: &OrderId) -> String {
    json!({
        "id": "evt_2",
        "type": "payment_intent.payment_failed",
        "data": {"object": {"id": "pi_2", "status": "requires_payment_method", "metadata": {"order_id": order_id}}}
    })
    .to_string()
}

fn coinbase_event(event_type: &str, order_id: &OrderId) -> String {
    json!({
        "event": {
            "id": "24934862-d980-46cb-9402-43c81b0cdba6",
            "type": event_type,
            "data": {"id": "f765421f", "code": "66BEOV2A", "metadata": {"order_id": order_id}}
        }
    })
    .to_string()
}

#[actix_web::test]
async fn signed_stripe_webhook_fulfills_order() {
    let _ = env_logger::try_init().ok();
    let h = Harness::new().await;
    let order = pending_order(&h.db).await;
    let body = session_completed(&order.id);
    let (status, response) = h.stripe(&body, Some(&stripe_signature(&body))).await;
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&response).unwrap();
    assert_eq!(response["received"], true);
    assert_eq!(response["order_id"], order.id.as_str());
    assert_eq!(h.order_status(&order.id).await, (OrderStatusType::Paid, PaymentStatus::Paid));
    assert_eq!(h.shipping.labels_purchased(), 1);
    assert_eq!(h.mailer.campaigns().len(), 1);

    // Stripe redelivers the same event
    let (status, response) = h.stripe(&body, Some(&stripe_signature(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, format!(r#"{{"received":true,"order_id":"{}","message":"Already processed"}}"#, order.id));
    assert_eq!(h.shipping.labels_purchased(), 1);
    assert_eq!(h.mailer.campaigns().len(), 1);
    tear_down(h.db).await;
}

#[actix_web::test]
async fn bad_stripe_signatures() {
    let _ = env_logger::try_init().ok();
    let h = Harness::new().await;
    let order = pending_order(&h.db).await;
    let body = session_completed(&order.id);
    let signature = stripe_signature(&body);
    let tampered = body.replace("pi_1", "pi_9");
    let (status, _) = h.stripe(&tampered, Some(&signature)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.stripe(&body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = stripe_signature_header(STRIPE_SECRET, body.as_bytes(), Utc::now().timestamp() - 3600);
    let (status, _) = h.stripe(&body, Some(&stale)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(h.order_status(&order.id).await, (OrderStatusType::Pending, PaymentStatus::Pending));
    assert!(h.shipping.calls().is_empty());
    tear_down(h.db).await;
}

#[actix_web::test]
async fn webhook_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let h = Harness::new().await;
    let body = session_completed(&OrderId::from("no-such-order"));
    let (status, response) = h.stripe(&body, Some(&stripe_signature(&body))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response, r#"{"error":"The data was not found. Order no-such-order does not exist"}"#);
    tear_down(h.db).await;
}

#[actix_web::test]
async fn unhandled_and_malformed_events() {
    let _ = env_logger::try_init().ok();
    let h = Harness::new().await;
    let body = r#"{"id": "evt_3", "type": "customer.created", "data": {"object": {}}}"#;
    let (status, response) = h.stripe(body, Some(&stripe_signature(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, r#"{"error":"Unhandled event type: customer.created"}"#);

    let body = "this is not json";
    let (status, response) = h.stripe(body, Some(&stripe_signature(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.contains("Could not read request body"));
    tear_down(h.db).await;
}

#[actix_web::test]
async fn unconfigured_webhooks_are_refused() {
    let _ = env_logger::try_init().ok();
    let h = Harness::new().await;
    let order = pending_order(&h.db).await;
    let body = session_completed(&order.id);
    let configure = h.configure(WebhookVerifiers::default());
    let signature = stripe_signature(&body);
    let headers = [(STRIPE_SIGNATURE_HEADER, signature.as_str())];
    let (status, response) = post_request("/webhook/stripe", &body, &headers, configure).await.unwrap();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response, r#"{"error":"Stripe webhooks is not configured"}"#);
    assert_eq!(h.order_status(&order.id).await, (OrderStatusType::Pending, PaymentStatus::Pending));
    tear_down(h.db).await;
}

#[actix_web::test]
async fn failed_payments() {
    let _ = env_logger::try_init().ok();
    let h = Harness::new().await;
    let order = pending_order(&h.db).await;
    let body = payment_failed(&order.id);
    let (status, _) = h.stripe(&body, Some(&stripe_signature(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.order_status(&order.id).await, (OrderStatusType::Failed, PaymentStatus::Failed));

    // A late failure notice never undoes a payment
    let paid = pending_order(&h.db).await;
    let body = session_completed(&paid.id);
    let (status, _) = h.stripe(&body, Some(&stripe_signature(&body))).await;
    assert_eq!(status, StatusCode::OK);
    let body = payment_failed(&paid.id);
    let (status, response) = h.stripe(&body, Some(&stripe_signature(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains(r#""received":true"#));
    assert_eq!(h.order_status(&paid.id).await, (OrderStatusType::Paid, PaymentStatus::Paid));
    tear_down(h.db).await;
}

#[actix_web::test]
async fn coinbase_charges() {
    let _ = env_logger::try_init().ok();
    let h = Harness::new().await;
    let order = pending_order(&h.db).await;
    let body = coinbase_event("charge:delayed", &order.id);
    let (status, _) = h.coinbase(&body, Some(&sign_hex(COINBASE_SECRET, body.as_bytes()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.order_status(&order.id).await, (OrderStatusType::Pending, PaymentStatus::Delayed));

    let body = coinbase_event("charge:confirmed", &order.id);
    let (status, _) = h.coinbase(&body, Some(&sign_hex("wrong secret", body.as_bytes()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.order_status(&order.id).await, (OrderStatusType::Pending, PaymentStatus::Delayed));

    let (status, response) = h.coinbase(&body, Some(&sign_hex(COINBASE_SECRET, body.as_bytes()))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains(order.id.as_str()));
    assert_eq!(h.order_status(&order.id).await, (OrderStatusType::Paid, PaymentStatus::Paid));
    let stored = h.db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_id.as_deref(), Some("f765421f"));
    assert_eq!(h.shipping.labels_purchased(), 1);
    tear_down(h.db).await;
}
