//! `SqliteDatabase` is the SQLite implementation of the order store.
//!
//! It implements [`OrderManagement`] and [`DiscountManagement`]. Every state transition is a single conditional
//! `UPDATE`, so concurrent webhook deliveries for the same order are serialised by SQLite itself. Every write runs in
//! its own transaction and is committed before the call returns.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{db_url, discounts, new_pool, orders, orders::InsertOrderResult, paid_orders, SqliteDatabaseError};
use crate::{
    db::traits::{ClaimResult, DiscountManagement, InsertPaidOrderResult, OrderManagement, StoreError},
    db_types::{
        DiscountCode,
        NewDiscountCode,
        NewOrder,
        NewPaidOrder,
        Order,
        OrderId,
        OrderStatusType,
        PaidOrder,
        PaymentProvider,
        PaymentStatus,
        TrackingInfo,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `DD_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Works out why a conditional update on `order_id` touched no rows.
    async fn explain_no_change(&self, order_id: &OrderId, to: OrderStatusType) -> Result<StoreError, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(match order {
            None => StoreError::OrderNotFound(order_id.clone()),
            Some(o) => StoreError::InvalidTransition { order_id: order_id.clone(), from: o.status, to },
        })
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::idempotent_insert(order, &mut tx).await? {
            InsertOrderResult::Inserted(order) => order,
            InsertOrderResult::AlreadyExists(order) => return Err(StoreError::OrderAlreadyExists(order.id)),
        };
        if let (Some(code), Some(email)) = (&order.discount_code, &order.customer_email) {
            if !discounts::claim_for_order(code, email, &order.id, &Utc::now(), &mut tx).await? {
                // Dropping the transaction rolls the order back too
                debug!("🗃️ Discount code {code} is no longer available. Order {} was not saved", order.id);
                return Err(StoreError::DiscountUnavailable(code.clone()));
            }
        }
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB", order.id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn set_checkout_reference(
        &self,
        order_id: &OrderId,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let n = orders::set_checkout_reference(order_id, provider, reference, &mut tx).await?;
        tx.commit().await?;
        if n == 0 {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        debug!("🗃️ Order {order_id} has {provider} checkout reference {reference}");
        Ok(())
    }

    async fn claim_payment(
        &self,
        order_id: &OrderId,
        provider: PaymentProvider,
        payment_id: &str,
    ) -> Result<ClaimResult, StoreError> {
        let mut tx = self.pool.begin().await?;
        let claimed = orders::claim_payment(order_id, provider, payment_id, &mut tx).await? == 1;
        let order = orders::fetch_order_by_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        let result = match (claimed, order.status) {
            (true, _) => {
                info!("🗃️ Order {order_id} claimed as paid via {provider} ({payment_id})");
                ClaimResult::Claimed(order)
            },
            (false, OrderStatusType::Paid) => {
                debug!("🗃️ Order {order_id} was already paid");
                ClaimResult::AlreadyPaid(order)
            },
            (false, _) => {
                warn!("🗃️ Order {order_id} is {} and cannot be marked as paid", order.status);
                ClaimResult::NotClaimable(order)
            },
        };
        Ok(result)
    }

    async fn annul_order(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        payment_id: Option<&str>,
    ) -> Result<Order, StoreError> {
        let payment_status = match status {
            OrderStatusType::Failed => PaymentStatus::Failed,
            OrderStatusType::Canceled => PaymentStatus::Canceled,
            other => {
                return Err(StoreError::InvalidTransition {
                    order_id: order_id.clone(),
                    from: OrderStatusType::Pending,
                    to: other,
                })
            },
        };
        let mut tx = self.pool.begin().await?;
        let n = orders::annul_order(order_id, status, payment_status, payment_id, &mut tx).await?;
        let order = orders::fetch_order_by_id(order_id, &mut tx).await?;
        tx.commit().await?;
        match (n, order) {
            (1, Some(order)) => {
                info!("🗃️ Order {order_id} is now {status}");
                Ok(order)
            },
            _ => Err(self.explain_no_change(order_id, status).await?),
        }
    }

    async fn set_payment_status(&self, order_id: &OrderId, status: PaymentStatus) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let n = orders::set_payment_status(order_id, status, &mut tx).await?;
        let order = orders::fetch_order_by_id(order_id, &mut tx).await?;
        tx.commit().await?;
        match (n, order) {
            (1, Some(order)) => {
                debug!("🗃️ Payment status of order {order_id} is now {status}");
                Ok(order)
            },
            _ => Err(self.explain_no_change(order_id, OrderStatusType::Pending).await?),
        }
    }

    async fn update_order_tracking(&self, order_id: &OrderId, tracking: &TrackingInfo) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let n = orders::update_tracking(order_id, tracking, &mut tx).await?;
        tx.commit().await?;
        if n == 0 {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        Ok(())
    }

    async fn insert_paid_order(&self, paid_order: NewPaidOrder) -> Result<InsertPaidOrderResult, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = paid_orders::idempotent_insert(paid_order, &mut tx).await?;
        tx.commit().await?;
        if let InsertPaidOrderResult::Inserted(p) = &result {
            debug!("🗃️ Paid order #{} saved for order {}", p.id, p.original_order_id);
        }
        Ok(result)
    }

    async fn fetch_paid_order(&self, order_id: &OrderId) -> Result<Option<PaidOrder>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let paid = paid_orders::fetch_by_order_id(order_id, &mut conn).await?;
        Ok(paid)
    }

    async fn update_paid_order_tracking(&self, order_id: &OrderId, tracking: &TrackingInfo) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let n = paid_orders::update_tracking(order_id, tracking, &mut tx).await?;
        tx.commit().await?;
        if n == 0 {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        Ok(())
    }
}

impl DiscountManagement for SqliteDatabase {
    async fn insert_discount(&self, discount: NewDiscountCode) -> Result<DiscountCode, StoreError> {
        let mut tx = self.pool.begin().await?;
        let discount = discounts::insert_discount(discount, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Discount code {} issued to {}", discount.code, discount.email);
        Ok(discount)
    }

    async fn fetch_discount(&self, code: &str, email: &str) -> Result<Option<DiscountCode>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let discount = discounts::fetch_discount(code, email, &mut conn).await?;
        Ok(discount)
    }

    async fn mark_discount_used(&self, code: &str, email: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let changed = discounts::mark_used(code, email, &now, &mut tx).await?;
        tx.commit().await?;
        Ok(changed)
    }

    async fn redeem_discount(
        &self,
        code: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DiscountCode>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let redeemed = discounts::redeem(code, email, &now, &mut tx).await?;
        tx.commit().await?;
        if redeemed.is_some() {
            info!("🗃️ Discount code {code} redeemed by {email}");
        }
        Ok(redeemed)
    }
}
