use std::str::FromStr;

use cucumber::{then, when};
use dd_common::Money;
use fulfillment_engine::{
    db_types::{LineItem, OrderId, OrderStatusType, PaymentProvider, PaymentStatus},
    providers::PaymentConfirmation,
    DiscountApiError,
    DiscountManagement,
    FulfillmentError,
    NewOrderRequest,
    OrderManagement,
};
use log::*;

use crate::cucumber::FulfillmentWorld;

pub fn parse_money(s: &str) -> Money {
    Money::from_str(s).expect("Not a valid amount")
}

fn provider(s: &str) -> PaymentProvider {
    PaymentProvider::from_str(s).expect("Not a payment provider")
}

async fn create_order(world: &mut FulfillmentWorld, request: NewOrderRequest) {
    let result = world.system().orders.create_order(request).await;
    if let Ok(created) = &result {
        world.current_order = Some(created.order.id.clone());
    }
    world.last_order = Some(result);
}

#[when(expr = "I create an order for {int} x {string} at £{word}")]
async fn order_items(world: &mut FulfillmentWorld, quantity: u32, name: String, price: String) {
    let items = vec![LineItem::new(name, parse_money(&price), quantity)];
    let request = NewOrderRequest { items, ..Default::default() };
    create_order(world, request).await;
}

#[when(expr = "I create an order for {int} x {string} at £{word} with email {string} and discount {string}")]
async fn order_with_discount(
    world: &mut FulfillmentWorld,
    quantity: u32,
    name: String,
    price: String,
    email: String,
    code: String,
) {
    let request = NewOrderRequest {
        items: vec![LineItem::new(name, parse_money(&price), quantity)],
        customer_email: Some(email),
        discount_code: Some(code),
        ..Default::default()
    };
    create_order(world, request).await;
}

#[when("I create an empty order")]
async fn empty_order(world: &mut FulfillmentWorld) {
    create_order(world, NewOrderRequest::default()).await;
}

#[then(expr = "the order {word} is £{word}")]
async fn order_total_line(world: &mut FulfillmentWorld, line: String, amount: String) {
    let created = match world.last_order.as_ref().expect("No order was created") {
        Ok(c) => c,
        Err(e) => panic!("Order creation failed: {e}"),
    };
    let totals = &created.totals;
    let actual = match line.as_str() {
        "subtotal" => totals.subtotal,
        "shipping" => totals.shipping,
        "discount" => totals.discount,
        "total" => {
            assert_eq!(created.order.amount, totals.total);
            totals.total
        },
        other => panic!("Unknown order line: {other}"),
    };
    assert_eq!(actual, parse_money(&amount), "Order {line} was {actual}");
}

#[then(expr = "the order is rejected with {string}")]
async fn order_rejected(world: &mut FulfillmentWorld, message: String) {
    match world.last_order.as_ref().expect("No order was created") {
        Ok(c) => panic!("Order {} was created unexpectedly", c.order.id),
        Err(e) => assert_eq!(e.to_string(), message),
    }
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut FulfillmentWorld, status: String) {
    let expected = OrderStatusType::from_str(&status).expect("Not an order status");
    let oid = world.current_order();
    let order = world.system().db.fetch_order(&oid).await.expect("Error fetching order").expect("Order not found");
    assert_eq!(order.status, expected);
}

#[then(expr = "the order is pending with payment status {word}")]
async fn order_payment_status(world: &mut FulfillmentWorld, status: String) {
    let expected = PaymentStatus::from_str(&status).expect("Not a payment status");
    let oid = world.current_order();
    let order = world.system().db.fetch_order(&oid).await.expect("Error fetching order").expect("Order not found");
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.payment_status, expected);
}

#[when(expr = "{word} confirms payment {string} for the order")]
async fn confirm_payment(world: &mut FulfillmentWorld, provider_name: String, payment_id: String) {
    let oid = world.current_order();
    confirm_payment_for(world, provider(&provider_name), oid, payment_id).await;
}

#[when(expr = "{word} confirms payment {string} for order {string}")]
async fn confirm_payment_for_order(
    world: &mut FulfillmentWorld,
    provider_name: String,
    payment_id: String,
    oid: String,
) {
    confirm_payment_for(world, provider(&provider_name), OrderId::from(oid.as_str()), payment_id).await;
}

async fn confirm_payment_for(
    world: &mut FulfillmentWorld,
    provider: PaymentProvider,
    oid: OrderId,
    payment_id: String,
) {
    let confirmation = PaymentConfirmation::new(provider, oid, payment_id);
    let result = world.system().fulfillment.process_payment_confirmed(confirmation).await;
    debug!("🚀️ Fulfillment result: {result:?}");
    world.last_fulfillment = Some(result);
}

#[when(expr = "{word} reports payment {string} for the order as {word}")]
async fn payment_failure(world: &mut FulfillmentWorld, _provider: String, payment_id: String, status: String) {
    let status = PaymentStatus::from_str(&status).expect("Not a payment status");
    let oid = world.current_order();
    let result = world.system().fulfillment.record_payment_failure(&oid, status, Some(&payment_id)).await;
    world.last_failure = Some(result);
}

#[then("the payment failure is rejected")]
async fn failure_rejected(world: &mut FulfillmentWorld) {
    match world.last_failure.as_ref().expect("No payment failure was recorded") {
        Err(FulfillmentError::InvalidTransition { .. }) => {},
        other => panic!("Expected an invalid transition, got {other:?}"),
    }
}

#[then("the fulfillment succeeds")]
async fn fulfillment_succeeds(world: &mut FulfillmentWorld) {
    let result = world.last_fulfillment.as_ref().expect("No payment was confirmed");
    assert!(result.is_ok(), "Fulfillment failed: {result:?}");
}

#[then("the fulfillment is a duplicate")]
async fn fulfillment_duplicate(world: &mut FulfillmentWorld) {
    let result = world.last_fulfillment.as_ref().expect("No payment was confirmed").as_ref().expect("Failed");
    assert!(result.duplicate);
}

#[then("the fulfillment fails because the order does not exist")]
async fn fulfillment_unknown_order(world: &mut FulfillmentWorld) {
    match world.last_fulfillment.as_ref().expect("No payment was confirmed") {
        Err(FulfillmentError::OrderNotFound(_)) => {},
        other => panic!("Expected OrderNotFound, got {other:?}"),
    }
}

#[then("the fulfillment fails because the order is not payable")]
async fn fulfillment_not_payable(world: &mut FulfillmentWorld) {
    match world.last_fulfillment.as_ref().expect("No payment was confirmed") {
        Err(FulfillmentError::OrderNotPayable { .. }) => {},
        other => panic!("Expected OrderNotPayable, got {other:?}"),
    }
}

#[then("the fulfillment fails because the order was paid by another payment")]
async fn fulfillment_other_payment(world: &mut FulfillmentWorld) {
    match world.last_fulfillment.as_ref().expect("No payment was confirmed") {
        Err(FulfillmentError::PaidByDifferentPayment(_)) => {},
        other => panic!("Expected PaidByDifferentPayment, got {other:?}"),
    }
}

#[then(expr = "the fulfillment has tracking number {string}")]
async fn fulfillment_tracking(world: &mut FulfillmentWorld, number: String) {
    let result = world.last_fulfillment.as_ref().expect("No payment was confirmed").as_ref().expect("Failed");
    let tracking = result.tracking.as_ref().expect("No tracking details");
    assert_eq!(tracking.tracking_number.as_deref(), Some(number.as_str()));
    assert!(result.notice.is_none());
    assert_eq!(result.order.tracking_number.as_deref(), Some(number.as_str()));
}

#[then("the fulfillment has no tracking")]
async fn fulfillment_no_tracking(world: &mut FulfillmentWorld) {
    let result = world.last_fulfillment.as_ref().expect("No payment was confirmed").as_ref().expect("Failed");
    assert!(result.tracking.is_none());
}

#[then(expr = "the fulfillment notice is {string}")]
async fn fulfillment_notice(world: &mut FulfillmentWorld, notice: String) {
    let result = world.last_fulfillment.as_ref().expect("No payment was confirmed").as_ref().expect("Failed");
    assert_eq!(result.notice.as_deref(), Some(notice.as_str()));
}

#[then("a paid order exists for the order")]
async fn paid_order_exists(world: &mut FulfillmentWorld) {
    let oid = world.current_order();
    let paid = world.system().db.fetch_paid_order(&oid).await.expect("Error fetching paid order");
    let paid = paid.expect("No paid order");
    let order = world.system().db.fetch_order(&oid).await.expect("Error fetching order").expect("Order not found");
    assert_eq!(paid.amount, order.amount);
    assert_eq!(paid.items, order.items);
    assert_eq!(Some(paid.payment_id), order.payment_id);
}

#[then(expr = "no paid order exists for order {string}")]
async fn no_paid_order(world: &mut FulfillmentWorld, oid: String) {
    let paid = world.system().db.fetch_paid_order(&OrderId::from(oid.as_str())).await.expect("Error fetching");
    assert!(paid.is_none());
}

#[then(expr = "the paid order has tracking number {string}")]
async fn paid_order_tracking(world: &mut FulfillmentWorld, number: String) {
    let oid = world.current_order();
    let paid = world.system().db.fetch_paid_order(&oid).await.expect("Error fetching paid order");
    let paid = paid.expect("No paid order");
    assert_eq!(paid.tracking_number.as_deref(), Some(number.as_str()));
    assert!(paid.label_url.is_some());
    assert!(paid.packing_slip_url.is_some());
}

#[then(expr = "{int} shipping label(s) was/were purchased")]
async fn labels_purchased(world: &mut FulfillmentWorld, count: u64) {
    assert_eq!(world.system().shipping.labels_purchased(), count);
}

#[then(expr = "{int} tracking email(s) was/were sent to {string}")]
async fn tracking_emails(world: &mut FulfillmentWorld, count: usize, email: String) {
    let campaigns = world.system().mailer.campaigns();
    assert_eq!(campaigns.len(), count);
    assert!(campaigns.iter().all(|c| c.recipients == vec![email.clone()]));
}

#[then("no tracking email was sent")]
async fn no_tracking_email(world: &mut FulfillmentWorld) {
    assert!(world.system().mailer.campaigns().is_empty());
}

#[when(expr = "{string} redeems the discount code {string}")]
async fn redeem_code(world: &mut FulfillmentWorld, email: String, code: String) {
    let result = world.system().discounts.redeem(&code, &email).await;
    world.last_discount = Some(result);
}

#[when(expr = "I validate the discount code {string} for {string}")]
async fn validate_code(world: &mut FulfillmentWorld, code: String, email: String) {
    let result = world.system().discounts.validate(&code, &email).await;
    world.last_discount = Some(result);
}

#[when(expr = "{string} marks the discount code {string} as used")]
async fn mark_code_used(world: &mut FulfillmentWorld, email: String, code: String) {
    let changed = world.system().discounts.mark_used(&code, &email).await.expect("Error marking code used");
    world.last_mark_used = Some(changed);
}

#[then(expr = "the discount code {word} changed")]
async fn code_changed(world: &mut FulfillmentWorld, was: String) {
    let expected = match was.as_str() {
        "was" => true,
        "wasn't" => false,
        other => panic!("Expected 'was' or 'wasn't', got {other}"),
    };
    assert_eq!(world.last_mark_used, Some(expected));
}

#[then(expr = "the discount code {string} for {string} is used")]
async fn code_is_used(world: &mut FulfillmentWorld, code: String, email: String) {
    let discount = world.system().db.fetch_discount(&code, &email).await.expect("Error fetching code");
    let discount = discount.expect("Discount code not found");
    assert!(discount.used);
    assert!(discount.used_at.is_some());
}

#[then("the discount code is accepted")]
async fn code_accepted(world: &mut FulfillmentWorld) {
    let result = world.last_discount.as_ref().expect("No discount code was checked");
    assert!(result.is_ok(), "Discount code was rejected: {result:?}");
}

#[then(expr = "the discount code is rejected with {string}")]
async fn code_rejected(world: &mut FulfillmentWorld, message: String) {
    match world.last_discount.as_ref().expect("No discount code was checked") {
        Err(e @ DiscountApiError::Rejected(_)) => assert_eq!(e.to_string(), message),
        other => panic!("Expected a rejection, got {other:?}"),
    }
}
