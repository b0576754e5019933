use std::{fmt::Debug, time::Duration};

use cucumber::World;
use fulfillment_engine::{
    db_types::{DiscountCode, Order, OrderId},
    events::EventProducers,
    test_utils::{
        fakes::{FakeMailer, FakeShipping, ShippingBehaviour},
        prepare_env::{prepare_test_env, random_db_path},
    },
    CreatedOrder,
    DiscountApi,
    DiscountApiError,
    FulfillmentApi,
    FulfillmentError,
    FulfillmentResult,
    NotificationApi,
    OrderApi,
    OrderApiError,
    ShippingLabelApi,
    ShippingLabelConfig,
    SqliteDatabase,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct FulfillmentWorld {
    pub system: Option<FulfillmentSystem>,
    pub current_order: Option<OrderId>,
    pub last_order: Option<Result<CreatedOrder, OrderApiError>>,
    pub last_fulfillment: Option<Result<FulfillmentResult, FulfillmentError>>,
    pub last_failure: Option<Result<Order, FulfillmentError>>,
    pub last_discount: Option<Result<DiscountCode, DiscountApiError>>,
    pub last_mark_used: Option<bool>,
}

pub struct FulfillmentSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub shipping: FakeShipping,
    pub mailer: FakeMailer,
    pub fulfillment: FulfillmentApi<SqliteDatabase, FakeShipping, FakeMailer>,
    pub orders: OrderApi<SqliteDatabase>,
    pub discounts: DiscountApi<SqliteDatabase>,
}

impl Debug for FulfillmentSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentSystem ({})", self.db_path)
    }
}

impl FulfillmentWorld {
    pub fn system(&self) -> &FulfillmentSystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn system_mut(&mut self) -> &mut FulfillmentSystem {
        self.system.as_mut().expect("System not initialised")
    }

    pub fn current_order(&self) -> OrderId {
        self.current_order.clone().expect("No order has been created")
    }
}

impl FulfillmentSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        prepare_test_env(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        debug!("Created database: {db_path}");
        let shipping = FakeShipping::new(ShippingBehaviour::Succeed);
        let mailer = FakeMailer::default();
        let fulfillment = fulfillment_api(&db, &shipping, &mailer, ShippingLabelConfig::default());
        let orders = OrderApi::new(db.clone());
        let discounts = DiscountApi::new(db.clone());
        Self { db_path, db, shipping, mailer, fulfillment, orders, discounts }
    }

    pub fn with_shipping(&mut self, behaviour: ShippingBehaviour, timeout: Duration) {
        self.shipping = FakeShipping::new(behaviour);
        let config = ShippingLabelConfig { call_timeout: timeout, ..Default::default() };
        self.fulfillment = fulfillment_api(&self.db, &self.shipping, &self.mailer, config);
    }
}

fn fulfillment_api(
    db: &SqliteDatabase,
    shipping: &FakeShipping,
    mailer: &FakeMailer,
    config: ShippingLabelConfig,
) -> FulfillmentApi<SqliteDatabase, FakeShipping, FakeMailer> {
    let timeout = config.call_timeout;
    let shipping = ShippingLabelApi::new(shipping.clone(), config);
    let notifications = NotificationApi::new(mailer.clone(), timeout);
    FulfillmentApi::new(db.clone(), shipping, notifications, EventProducers::default())
}
