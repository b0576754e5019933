use actix_web::{http::StatusCode, web, web::ServiceConfig};
use dd_common::Money;
use fulfillment_engine::{
    db_types::{LineItem, NewOrder, OrderId, OrderStatusType, PaymentProvider},
    providers::{CheckoutSession, PaymentCheck, PaymentConfirmation, PaymentProviderError},
    test_utils::fakes::{FakeMailer, FakeShipping, ShippingBehaviour},
    CheckoutApi,
    OrderManagement,
    SqliteDatabase,
};
use serde_json::Value;

use super::{
    helpers::{address, fulfillment_api, pending_order, post_request, tear_down, test_db},
    mocks::MockGateway,
};
use crate::{
    routes::{PaypalCaptureRoute, PaypalCreateOrderRoute, StripeCheckoutSessionRoute, StripeVerifyPaymentRoute},
    server::json_config,
};

#[actix_web::test]
async fn stripe_checkout_session() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = pending_order(&db).await;
    let mut gateway = MockGateway::new();
    gateway.expect_provider().returning(|| PaymentProvider::Stripe);
    gateway.expect_create_checkout().times(1).returning(|order| {
        Ok(CheckoutSession {
            provider: PaymentProvider::Stripe,
            reference: "cs_test_1".into(),
            redirect_url: Some(format!("https://checkout.stripe.com/c/pay/cs_test_1#{}", order.id)),
        })
    });
    let body = format!(r#"{{"orderId": "{}"}}"#, order.id);
    let (status, body) = post_request("/api/stripe/checkout-session", &body, &[], configure_checkout(&db, gateway))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(session["order_id"], order.id.as_str());
    assert_eq!(session["provider"], "stripe");
    assert_eq!(session["reference"], "cs_test_1");
    let stored = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.checkout_reference.as_deref(), Some("cs_test_1"));
    assert_eq!(stored.payment_provider, Some(PaymentProvider::Stripe));
    tear_down(db).await;
}

#[actix_web::test]
async fn checkout_needs_a_pending_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let mut gateway = MockGateway::new();
    gateway.expect_provider().returning(|| PaymentProvider::Stripe);
    gateway.expect_create_checkout().never();
    let body = r#"{"order_id": "no-such-order"}"#;
    let (status, body) =
        post_request("/api/stripe/checkout-session", body, &[], configure_checkout(&db, gateway)).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order no-such-order does not exist"}"#);

    let order = pending_order(&db).await;
    db.claim_payment(&order.id, PaymentProvider::PayPal, "5O190127TN364715T").await.unwrap();
    let mut gateway = MockGateway::new();
    gateway.expect_provider().returning(|| PaymentProvider::Stripe);
    gateway.expect_create_checkout().never();
    let body = format!(r#"{{"order_id": "{}"}}"#, order.id);
    let (status, body) =
        post_request("/api/stripe/checkout-session", &body, &[], configure_checkout(&db, gateway)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("only pending orders can be checked out"));
    tear_down(db).await;
}

#[actix_web::test]
async fn unconfigured_provider() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = pending_order(&db).await;
    let mut gateway = MockGateway::new();
    gateway.expect_provider().returning(|| PaymentProvider::PayPal);
    gateway
        .expect_create_checkout()
        .returning(|_| Err(PaymentProviderError::NotConfigured(PaymentProvider::PayPal)));
    let body = format!(r#"{{"order_id": "{}"}}"#, order.id);
    let (status, body) =
        post_request("/api/paypal/orders", &body, &[], configure_checkout(&db, gateway)).await.unwrap();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, r#"{"error":"paypal payments is not configured"}"#);
    tear_down(db).await;
}

#[actix_web::test]
async fn verify_stripe_payment() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = pending_order(&db).await;
    let (shipping, mailer) = (FakeShipping::new(ShippingBehaviour::Succeed), FakeMailer::default());
    let body = r#"{"sessionId": "cs_test_1"}"#;

    let (status, body) =
        post_request("/api/stripe/verify-payment", body, &[], configure_verify(&db, &shipping, &mailer, &order.id))
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["payment_status"], "paid");
    assert_eq!(result["duplicate"], false);
    assert_eq!(result["tracking"]["tracking_number"], "H001");
    assert!(result.get("notice").map_or(true, Value::is_null));
    assert_eq!(shipping.labels_purchased(), 1);
    assert_eq!(mailer.campaigns().len(), 1);
    let stored = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Paid);
    assert_eq!(stored.payment_id.as_deref(), Some("pi_1"));
    assert_eq!(stored.tracking_number.as_deref(), Some("H001"));

    // The storefront refreshes the success page. Nothing is bought or sent twice.
    let body = r#"{"session_id": "cs_test_1"}"#;
    let (status, body) =
        post_request("/api/stripe/verify-payment", body, &[], configure_verify(&db, &shipping, &mailer, &order.id))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["duplicate"], true);
    assert_eq!(result["tracking"]["tracking_number"], "H001");
    assert_eq!(shipping.labels_purchased(), 1);
    assert_eq!(mailer.campaigns().len(), 1);
    tear_down(db).await;
}

#[actix_web::test]
async fn unpaid_stripe_session() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = pending_order(&db).await;
    let (shipping, mailer) = (FakeShipping::new(ShippingBehaviour::Succeed), FakeMailer::default());
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().returning(|_| Ok(PaymentCheck::NotPaid { status: "unpaid".into() }));
    let configure = configure_payment(&db, &shipping, &mailer, gateway);
    let (status, body) =
        post_request("/api/stripe/verify-payment", r#"{"sessionId": "cs_test_1"}"#, &[], configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"payment_status":"unpaid","error":"Payment was not completed"}"#);
    assert!(shipping.calls().is_empty());
    let stored = db.fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatusType::Pending);

    let configure = configure_payment(&db, &shipping, &mailer, MockGateway::new());
    let (status, body) =
        post_request("/api/stripe/verify-payment", r#"{"sessionId": " "}"#, &[], configure).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Session ID is required"}"#);
    tear_down(db).await;
}

#[actix_web::test]
async fn paypal_capture_uses_paypal_address() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    // The PayPal button flow never asks the storefront for an address
    let items = vec![LineItem::new("CBD Gummies", Money::new(2000, 2), 1)];
    let order = db.insert_order(NewOrder::new(items, Money::new(2599, 2))).await.unwrap();
    let (shipping, mailer) = (FakeShipping::new(ShippingBehaviour::Succeed), FakeMailer::default());
    let confirmation = PaymentConfirmation::new(PaymentProvider::PayPal, order.id.clone(), "5O190127TN364715T")
        .with_capture_id("3C679366HH908993F")
        .with_email(Some("jo@example.com".into()))
        .with_shipping_address(Some(address()));
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_payment()
        .withf(|reference| reference.to_string() == "5O190127TN364715T")
        .times(1)
        .returning(move |_| Ok(PaymentCheck::Paid(confirmation.clone())));
    let configure = configure_payment(&db, &shipping, &mailer, gateway);
    let (status, body) =
        post_request("/api/paypal/capture", r#"{"orderID": "5O190127TN364715T"}"#, &[], configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["order"]["status"], "paid");
    assert_eq!(shipping.labels_purchased(), 1);
    let campaigns = mailer.campaigns();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].recipients, vec!["jo@example.com".to_string()]);
    let paid = db.fetch_paid_order(&order.id).await.unwrap().expect("Paid order was not saved");
    assert_eq!(paid.capture_id.as_deref(), Some("3C679366HH908993F"));
    assert_eq!(paid.shipping_address.map(|a| a.postal_code), Some("BS20 7BT".to_string()));
    tear_down(db).await;
}

#[actix_web::test]
async fn paypal_capture_not_completed() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let (shipping, mailer) = (FakeShipping::new(ShippingBehaviour::Succeed), FakeMailer::default());
    let mut gateway = MockGateway::new();
    gateway.expect_verify_payment().returning(|_| Ok(PaymentCheck::NotPaid { status: "PENDING".into() }));
    let configure = configure_payment(&db, &shipping, &mailer, gateway);
    let (status, body) =
        post_request("/api/paypal/capture", r#"{"orderId": "5O190127TN364715T"}"#, &[], configure).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payment was not completed"}"#);
    assert!(shipping.calls().is_empty());
    tear_down(db).await;
}

fn configure_checkout(db: &SqliteDatabase, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    let api = CheckoutApi::new(db.clone(), gateway);
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(json_config())
            .app_data(web::Data::new(api))
            .service(StripeCheckoutSessionRoute::<SqliteDatabase, MockGateway>::new())
            .service(PaypalCreateOrderRoute::<SqliteDatabase, MockGateway>::new());
    }
}

/// A gateway that reports `pi_1` as a completed Stripe payment for `order_id`.
fn configure_verify(
    db: &SqliteDatabase,
    shipping: &FakeShipping,
    mailer: &FakeMailer,
    order_id: &OrderId,
) -> impl FnOnce(&mut ServiceConfig) {
    let confirmation = PaymentConfirmation::new(PaymentProvider::Stripe, order_id.clone(), "pi_1")
        .with_email(Some("jo@example.com".into()));
    let mut gateway = MockGateway::new();
    gateway
        .expect_verify_payment()
        .withf(|session_id| session_id.to_string() == "cs_test_1")
        .returning(move |_| Ok(PaymentCheck::Paid(confirmation.clone())));
    configure_payment(db, shipping, mailer, gateway)
}

fn configure_payment(
    db: &SqliteDatabase,
    shipping: &FakeShipping,
    mailer: &FakeMailer,
    gateway: MockGateway,
) -> impl FnOnce(&mut ServiceConfig) {
    let api = fulfillment_api(db, shipping, mailer);
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(json_config())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(gateway))
            .service(StripeVerifyPaymentRoute::<SqliteDatabase, FakeShipping, FakeMailer, MockGateway>::new())
            .service(PaypalCaptureRoute::<SqliteDatabase, FakeShipping, FakeMailer, MockGateway>::new());
    }
}
