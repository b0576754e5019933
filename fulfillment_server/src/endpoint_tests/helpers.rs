use std::time::Duration;

use actix_web::{
    body::MessageBody,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use dd_common::Money;
use fulfillment_engine::{
    db_types::{LineItem, NewOrder, Order, ShippingAddress},
    events::EventProducers,
    test_utils::{
        fakes::{FakeMailer, FakeShipping},
        prepare_env::{drop_database, prepare_test_env, random_db_path},
    },
    FulfillmentApi,
    NotificationApi,
    OrderManagement,
    ShippingLabelApi,
    ShippingLabelConfig,
    SqliteDatabase,
};
use log::debug;

pub async fn get_request<F>(path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send(TestRequest::get().uri(path), configure).await
}

pub async fn post_request<F>(
    path: &str,
    body: &str,
    headers: &[(&str, &str)],
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::post().uri(path).insert_header(ContentType::json()).set_payload(body.to_string());
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    send(req, configure).await
}

async fn send<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = res.into_body().try_into_bytes().map_err(|_| "Response body could not be read".to_string())?;
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

pub async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub async fn tear_down(db: SqliteDatabase) {
    db.close().await;
    drop_database(db.url()).await;
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Jo Bloggs".into(),
        line1: "1 High St".into(),
        city: "Bristol".into(),
        postal_code: "BS20 7BT".into(),
        country: "GB".into(),
        ..Default::default()
    }
}

/// A `pending` order for two bottles at £25 plus £5.99 shipping.
pub async fn pending_order(db: &SqliteDatabase) -> Order {
    let items = vec![LineItem::new("CBD Oil 10%", Money::new(2500, 2), 2)];
    let order = NewOrder::new(items, Money::new(5599, 2)).with_email("jo@example.com").with_shipping_address(address());
    db.insert_order(order).await.expect("Error inserting order")
}

pub fn fulfillment_api(
    db: &SqliteDatabase,
    shipping: &FakeShipping,
    mailer: &FakeMailer,
) -> FulfillmentApi<SqliteDatabase, FakeShipping, FakeMailer> {
    let config = ShippingLabelConfig { call_timeout: Duration::from_secs(5), ..Default::default() };
    let shipping = ShippingLabelApi::new(shipping.clone(), config);
    let notifications = NotificationApi::new(mailer.clone(), Duration::from_secs(5));
    FulfillmentApi::new(db.clone(), shipping, notifications, EventProducers::default())
}
