use std::time::Duration;

use chrono::Utc;
use cucumber::given;
use fulfillment_engine::{
    db_types::{LineItem, NewDiscountCode, ShippingAddress},
    test_utils::fakes::ShippingBehaviour,
    DiscountManagement,
    NewOrderRequest,
};
use rust_decimal::Decimal;

use crate::cucumber::{fulfillment_world::FulfillmentSystem, steps::parse_money, FulfillmentWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut FulfillmentWorld) {
    let system = FulfillmentSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a {int}% discount code {string} for {string} expiring in {int} days")]
async fn discount_code(world: &mut FulfillmentWorld, percent: i64, code: String, email: String, days: i64) {
    let expires_at = Utc::now() + chrono::Duration::days(days);
    let discount = NewDiscountCode::percentage(code, email, Decimal::from(percent), expires_at);
    world.system().db.insert_discount(discount).await.expect("Error inserting discount code");
}

// e.g. "Jo Bloggs, 1 High St, Bristol, bs207bt, United Kingdom"
fn parse_address(s: &str) -> ShippingAddress {
    let parts = s.split(',').map(str::trim).collect::<Vec<_>>();
    assert_eq!(parts.len(), 5, "Address must be 'name, line1, city, postcode, country'");
    ShippingAddress {
        name: parts[0].into(),
        line1: parts[1].into(),
        city: parts[2].into(),
        postal_code: parts[3].into(),
        country: parts[4].into(),
        ..Default::default()
    }
}

#[given(expr = "an order for {int} x {string} at £{word} shipping to {string} for {string}")]
async fn existing_order(
    world: &mut FulfillmentWorld,
    quantity: u32,
    name: String,
    price: String,
    address: String,
    email: String,
) {
    let request = NewOrderRequest {
        items: vec![LineItem::new(name, parse_money(&price), quantity)],
        customer_email: Some(email),
        shipping_address: Some(parse_address(&address)),
        ..Default::default()
    };
    let created = world.system().orders.create_order(request).await.expect("Error creating order");
    world.current_order = Some(created.order.id);
}

#[given(expr = "the shipping provider hangs for {int}ms with a {int}ms timeout")]
async fn hanging_shipping(world: &mut FulfillmentWorld, hang: u64, timeout: u64) {
    let behaviour = ShippingBehaviour::Hang(Duration::from_millis(hang));
    world.system_mut().with_shipping(behaviour, Duration::from_millis(timeout));
}

#[given("the shipping provider has no rates")]
async fn no_rates(world: &mut FulfillmentWorld) {
    world.system_mut().with_shipping(ShippingBehaviour::NoRates, Duration::from_secs(5));
}
