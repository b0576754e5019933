use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use fulfillment_engine::{
    db_types::{DiscountCode, DiscountType},
    DiscountApi,
    StoreError,
};
use rust_decimal::Decimal;

use super::{helpers::post_request, mocks::MockDiscountStore};
use crate::{
    routes::{MarkDiscountUsedRoute, ValidateDiscountRoute},
    server::json_config,
};

const WELCOME10_REQUEST: &str = r#"{"code": "WELCOME10", "email": "jo@example.com"}"#;
const NOPE_REQUEST: &str = r#"{"code": "NOPE", "email": "jo@example.com"}"#;

#[actix_web::test]
async fn valid_code() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDiscountStore::new();
    store
        .expect_fetch_discount()
        .withf(|code, email| code.to_string() == "WELCOME10" && email.to_string() == "jo@example.com")
        .times(1)
        .returning(|_, _| Ok(Some(discount(false, Duration::days(7)))));
    let body = r#"{"code": " WELCOME10 ", "email": "Jo@Example.COM"}"#;
    let (status, body) = post_request("/api/validate-discount", body, &[], configure(store)).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let validation: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(validation["valid"], true);
    assert_eq!(validation["discount"]["code"], "WELCOME10");
    assert_eq!(validation["discount"]["discount_type"], "percentage");
    assert!(validation.get("message").is_none());
}

#[actix_web::test]
async fn rejected_codes() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDiscountStore::new();
    store.expect_fetch_discount().returning(|_, _| Ok(Some(discount(false, Duration::days(-1)))));
    let (status, body) =
        post_request("/api/validate-discount", WELCOME10_REQUEST, &[], configure(store)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"valid":false,"message":"Discount code has expired"}"#);

    let mut store = MockDiscountStore::new();
    store.expect_fetch_discount().returning(|_, _| Ok(Some(discount(true, Duration::days(7)))));
    let (status, body) =
        post_request("/api/validate-discount", WELCOME10_REQUEST, &[], configure(store)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"valid":false,"message":"This discount code has already been used"}"#);

    let mut store = MockDiscountStore::new();
    store.expect_fetch_discount().returning(|_, _| Ok(None));
    let (status, body) = post_request("/api/validate-discount", NOPE_REQUEST, &[], configure(store)).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"valid":false,"message":"Invalid discount code"}"#);
}

#[actix_web::test]
async fn missing_fields() {
    let _ = env_logger::try_init().ok();
    // No expectations: the store must not be queried
    let store = MockDiscountStore::new();
    let (status, body) = post_request("/api/validate-discount", r#"{"code": "WELCOME10"}"#, &[], configure(store))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"valid":false,"message":"Both a discount code and an email address are required"}"#);
}

#[actix_web::test]
async fn store_failure() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDiscountStore::new();
    store.expect_fetch_discount().returning(|_, _| Err(StoreError::DatabaseError("disk full".into())));
    let (status, body) = post_request("/api/validate-discount", WELCOME10_REQUEST, &[], configure(store))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("disk full"));
}

#[actix_web::test]
async fn mark_discount_used() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDiscountStore::new();
    store.expect_redeem_discount().times(1).returning(|_, _, _| {
        let mut redeemed = discount(true, Duration::days(7));
        redeemed.used_at = Some(Utc::now());
        Ok(Some(redeemed))
    });
    store.expect_fetch_discount().never();
    let (status, body) = post_request("/api/mark-discount-used", WELCOME10_REQUEST, &[], configure(store))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Discount code WELCOME10 redeemed"}"#);
}

#[actix_web::test]
async fn mark_discount_used_twice() {
    let _ = env_logger::try_init().ok();
    let mut store = MockDiscountStore::new();
    // The conditional update matched nothing, so the code is looked up to explain why
    store.expect_redeem_discount().returning(|_, _, _| Ok(None));
    store.expect_fetch_discount().returning(|_, _| Ok(Some(discount(true, Duration::days(7)))));
    let (status, body) = post_request("/api/mark-discount-used", WELCOME10_REQUEST, &[], configure(store))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"success":false,"message":"This discount code has already been used"}"#);
}

fn discount(used: bool, expires_in: Duration) -> DiscountCode {
    DiscountCode {
        id: 1,
        code: "WELCOME10".into(),
        email: "jo@example.com".into(),
        discount_type: DiscountType::Percentage,
        discount_value: Decimal::from(10),
        expires_at: Utc::now() + expires_in,
        used,
        used_at: None,
        order_id: None,
        created_at: Utc::now() - Duration::days(1),
    }
}

fn configure(store: MockDiscountStore) -> impl FnOnce(&mut ServiceConfig) {
    let api = DiscountApi::new(store);
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(json_config())
            .app_data(web::Data::new(api))
            .service(ValidateDiscountRoute::<MockDiscountStore>::new())
            .service(MarkDiscountUsedRoute::<MockDiscountStore>::new());
    }
}
