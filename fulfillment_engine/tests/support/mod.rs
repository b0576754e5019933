#![allow(dead_code)]
use std::time::Duration;

use dd_common::Money;
use fulfillment_engine::{
    db_types::{LineItem, NewOrder, Order, ShippingAddress},
    events::EventProducers,
    test_utils::{
        fakes::{FakeMailer, FakeShipping, ShippingBehaviour},
        prepare_env::{drop_database, prepare_test_env, random_db_path},
    },
    FulfillmentApi,
    NotificationApi,
    OrderManagement,
    ShippingLabelApi,
    ShippingLabelConfig,
    SqliteDatabase,
};

pub async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating database")
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

pub async fn pending_order(db: &SqliteDatabase) -> Order {
    let items = vec![LineItem::new("CBD Gummies", Money::new(2500, 2), 2)];
    let order = NewOrder::new(items, Money::new(5599, 2)).with_email("jo@example.com").with_shipping_address(address());
    db.insert_order(order).await.expect("Error inserting order")
}

pub fn fulfillment_api(
    db: &SqliteDatabase,
    shipping: &FakeShipping,
    mailer: &FakeMailer,
    producers: EventProducers,
) -> FulfillmentApi<SqliteDatabase, FakeShipping, FakeMailer> {
    let config = ShippingLabelConfig { call_timeout: Duration::from_secs(5), ..Default::default() };
    let shipping = ShippingLabelApi::new(shipping.clone(), config);
    let notifications = NotificationApi::new(mailer.clone(), Duration::from_secs(5));
    FulfillmentApi::new(db.clone(), shipping, notifications, producers)
}

pub fn fakes() -> (FakeShipping, FakeMailer) {
    (FakeShipping::new(ShippingBehaviour::Succeed), FakeMailer::default())
}
