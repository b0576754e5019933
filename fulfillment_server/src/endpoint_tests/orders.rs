use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use fulfillment_engine::{
    db_types::{NewDiscountCode, OrderId, OrderStatusType, PaymentProvider},
    DiscountManagement,
    OrderApi,
    OrderManagement,
    SqliteDatabase,
};
use rust_decimal::Decimal;
use serde_json::Value;

use super::helpers::{get_request, pending_order, post_request, tear_down, test_db};
use crate::{
    routes::{CreateOrderRoute, FetchOrderRoute},
    server::json_config,
};

const TWO_BOTTLES: &str = r#"{
    "items": [{"id": "oil-10", "name": "CBD Oil 10%", "price": "25.00", "quantity": 2}],
    "customer_email": "Jo@Example.com",
    "shipping_address": {
        "name": "Jo Bloggs", "line1": "1 High St", "city": "Bristol", "postal_code": "BS20 7BT", "country": "GB"
    }
}"#;

const DISCOUNTED: &str = r#"{
    "items": [{"name": "CBD Oil 10%", "price": "25.00", "quantity": 2}],
    "customer_email": "jo@example.com",
    "discount_code": "WELCOME10"
}"#;

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let (status, body) = post_request("/api/orders", TWO_BOTTLES, &[], configure(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["order"]["status"], "pending");
    assert_eq!(created["order"]["payment_status"], "pending");
    assert_eq!(created["order"]["customer_email"], "jo@example.com");
    assert_eq!(created["order"]["amount"], "55.99");
    assert_eq!(created["totals"]["subtotal"], "50.00");
    assert_eq!(created["totals"]["shipping"], "5.99");
    assert_eq!(created["totals"]["total"], "55.99");
    let order_id = OrderId::from(created["order"]["id"].as_str().unwrap());
    let stored = db.fetch_order(&order_id).await.unwrap().expect("Order was not stored");
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.shipping_address.map(|a| a.city), Some("Bristol".to_string()));
    tear_down(db).await;
}

#[actix_web::test]
async fn free_shipping_is_strictly_above_threshold() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let at_threshold = r#"{"items": [{"name": "CBD Balm", "price": "75.00", "quantity": 1}]}"#;
    let (status, body) = post_request("/api/orders", at_threshold, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["totals"]["shipping"], "5.99");
    assert_eq!(created["totals"]["total"], "80.99");

    let over = r#"{"items": [{"name": "CBD Balm", "price": "75.01", "quantity": 1}]}"#;
    let (status, body) = post_request("/api/orders", over, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["totals"]["shipping"], "0.00");
    assert_eq!(created["totals"]["total"], "75.01");
    tear_down(db).await;
}

#[actix_web::test]
async fn client_totals_are_ignored() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let body = r#"{"items": [{"name": "CBD Gummies", "price": "20.00", "quantity": 1}], "total": "0.01"}"#;
    let (status, body) = post_request("/api/orders", body, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["order"]["amount"], "25.99");
    tear_down(db).await;
}

#[actix_web::test]
async fn order_with_discount_code() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let expires_at = Utc::now() + Duration::days(7);
    let code = NewDiscountCode::percentage("WELCOME10", "jo@example.com", Decimal::from(10), expires_at);
    db.insert_discount(code).await.unwrap();
    let (status, body) = post_request("/api/orders", DISCOUNTED, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["totals"]["discount"], "5.60");
    assert_eq!(created["totals"]["total"], "50.39");
    assert_eq!(created["order"]["discount_code"], "WELCOME10");
    let order_id = OrderId::from(created["order"]["id"].as_str().unwrap());
    let discount = db.fetch_discount("WELCOME10", "jo@example.com").await.unwrap().unwrap();
    assert!(discount.used);
    assert_eq!(discount.order_id, Some(order_id));

    // The code is spent, so a second order pays full price or not at all
    let (status, body) = post_request("/api/orders", DISCOUNTED, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"This discount code has already been used"}"#);
    tear_down(db).await;
}

#[actix_web::test]
async fn invalid_orders() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let (status, body) = post_request("/api/orders", r#"{"items": []}"#, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid cart: The cart is empty"}"#);

    let no_quantity = r#"{"items": [{"name": "CBD Balm", "price": "12.00", "quantity": 0}]}"#;
    let (status, body) = post_request("/api/orders", no_quantity, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("must have a quantity of at least 1"));

    let unknown_code = r#"{
        "items": [{"name": "CBD Balm", "price": "12.00", "quantity": 1}],
        "customer_email": "jo@example.com",
        "discount_code": "NOPE"
    }"#;
    let (status, body) = post_request("/api/orders", unknown_code, &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid discount code"}"#);

    let (status, body) = post_request("/api/orders", "{not json", &[], configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#));
    tear_down(db).await;
}

#[actix_web::test]
async fn fetch_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let order = pending_order(&db).await;
    db.claim_payment(&order.id, PaymentProvider::Coinbase, "charge_1").await.unwrap();
    let path = format!("/api/orders/{}", order.id);
    let (status, body) = get_request(&path, configure(&db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let fetched: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(fetched["id"], order.id.as_str());
    assert_eq!(fetched["status"], OrderStatusType::Paid.to_string());
    assert_eq!(fetched["payment_provider"], "coinbase");

    let (status, body) = get_request("/api/orders/no-such-order", configure(&db)).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order no-such-order does not exist"}"#);
    tear_down(db).await;
}

fn configure(db: &SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    let api = OrderApi::new(db.clone());
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(json_config())
            .app_data(web::Data::new(api))
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(FetchOrderRoute::<SqliteDatabase>::new());
    }
}
