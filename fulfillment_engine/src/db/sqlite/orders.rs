use chrono::{DateTime, Utc};
use dd_common::Money;
use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::{db_timestamp, is_unique_violation, SqliteDatabaseError},
    db_types::{
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        PaymentProvider,
        PaymentStatus,
        ShippingAddress,
        TrackingInfo,
    },
};

const ORDER_COLUMNS: &str = "id, status, payment_status, amount, currency, items, customer_email, shipping_address, \
                             discount_code, payment_provider, payment_id, checkout_reference, tracking_number, \
                             tracking_url, tracking_status, estimated_delivery, created_at, updated_at";

pub enum InsertOrderResult {
    Inserted(Order),
    AlreadyExists(Order),
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    status: String,
    payment_status: String,
    amount: Money,
    currency: String,
    items: String,
    customer_email: Option<String>,
    shipping_address: Option<String>,
    discount_code: Option<String>,
    payment_provider: Option<String>,
    payment_id: Option<String>,
    checkout_reference: Option<String>,
    tracking_number: Option<String>,
    tracking_url: Option<String>,
    tracking_status: Option<String>,
    estimated_delivery: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = SqliteDatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<OrderStatusType>().map_err(|e| corrupt(&row.id, e))?;
        let payment_status = row.payment_status.parse::<PaymentStatus>().map_err(|e| corrupt(&row.id, e))?;
        let payment_provider =
            row.payment_provider.map(|p| p.parse::<PaymentProvider>()).transpose().map_err(|e| corrupt(&row.id, e))?;
        let items = serde_json::from_str(&row.items)?;
        let shipping_address =
            row.shipping_address.as_deref().map(serde_json::from_str::<ShippingAddress>).transpose()?;
        Ok(Order {
            id: OrderId(row.id),
            status,
            payment_status,
            amount: row.amount,
            currency: row.currency,
            items,
            customer_email: row.customer_email,
            shipping_address,
            discount_code: row.discount_code,
            payment_provider,
            payment_id: row.payment_id,
            checkout_reference: row.checkout_reference,
            tracking_number: row.tracking_number,
            tracking_url: row.tracking_url,
            tracking_status: row.tracking_status,
            estimated_delivery: row.estimated_delivery,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn corrupt<E: std::fmt::Display>(id: &str, e: E) -> SqliteDatabaseError {
    SqliteDatabaseError::CorruptRecord(format!("order {id}: {e}"))
}

pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    if let Some(existing) = fetch_order_by_id(&order.id, conn).await? {
        return Ok(InsertOrderResult::AlreadyExists(existing));
    }
    let id = order.id.clone();
    match insert_order(order, conn).await {
        Ok(order) => Ok(InsertOrderResult::Inserted(order)),
        // Lost a race against a concurrent insert of the same id
        Err(SqliteDatabaseError::DriverError(e)) if is_unique_violation(&e) => {
            let existing = fetch_order_by_id(&id, conn).await?.ok_or(SqliteDatabaseError::DriverError(e))?;
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
        Err(e) => Err(e),
    }
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    let items = serde_json::to_string(&order.items)?;
    let address = order.shipping_address.as_ref().map(serde_json::to_string).transpose()?;
    let created_at = db_timestamp(&order.created_at);
    let sql = format!(
        r#"
        INSERT INTO orders (
            id,
            amount,
            currency,
            items,
            customer_email,
            shipping_address,
            discount_code,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        RETURNING {ORDER_COLUMNS};
        "#
    );
    let row: OrderRow = sqlx::query_as(&sql)
        .bind(order.id.as_str())
        .bind(order.amount)
        .bind(order.currency.as_str())
        .bind(items)
        .bind(order.customer_email.as_deref())
        .bind(address)
        .bind(order.discount_code.as_deref())
        .bind(created_at)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Order {} inserted", row.id);
    Order::try_from(row)
}

pub async fn fetch_order_by_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row: Option<OrderRow> = sqlx::query_as(&sql).bind(order_id.as_str()).fetch_optional(conn).await?;
    row.map(Order::try_from).transpose()
}

pub(crate) async fn set_checkout_reference(
    order_id: &OrderId,
    provider: PaymentProvider,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE orders SET payment_provider = $2, checkout_reference = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(order_id.as_str())
    .bind(provider.to_string())
    .bind(reference)
    .bind(db_timestamp(&Utc::now()))
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// The conditional `pending → paid` update. Returns the number of rows changed: 1 if this call won the claim, 0 if
/// the order is missing or no longer pending.
pub(crate) async fn claim_payment(
    order_id: &OrderId,
    provider: PaymentProvider,
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = 'paid',
            payment_status = 'paid',
            payment_provider = $2,
            payment_id = $3,
            updated_at = $4
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(order_id.as_str())
    .bind(provider.to_string())
    .bind(payment_id)
    .bind(db_timestamp(&Utc::now()))
    .execute(conn)
    .await?;
    debug!("🗃️ Payment claim for order {order_id}: {} row(s) updated", result.rows_affected());
    Ok(result.rows_affected())
}

pub(crate) async fn annul_order(
    order_id: &OrderId,
    status: OrderStatusType,
    payment_status: PaymentStatus,
    payment_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            status = $2,
            payment_status = $3,
            payment_id = COALESCE($4, payment_id),
            updated_at = $5
        WHERE id = $1 AND status = 'pending'
        "#,
    )
    .bind(order_id.as_str())
    .bind(status.to_string())
    .bind(payment_status.to_string())
    .bind(payment_id)
    .bind(db_timestamp(&Utc::now()))
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn set_payment_status(
    order_id: &OrderId,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result =
        sqlx::query("UPDATE orders SET payment_status = $2, updated_at = $3 WHERE id = $1 AND status = 'pending'")
            .bind(order_id.as_str())
            .bind(status.to_string())
            .bind(db_timestamp(&Utc::now()))
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn update_tracking(
    order_id: &OrderId,
    tracking: &TrackingInfo,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            tracking_number = $2,
            tracking_url = $3,
            tracking_status = $4,
            estimated_delivery = $5,
            updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(order_id.as_str())
    .bind(tracking.tracking_number.as_deref())
    .bind(tracking.tracking_url.as_deref())
    .bind(tracking.tracking_status.as_str())
    .bind(tracking.estimated_delivery.as_deref())
    .bind(db_timestamp(&Utc::now()))
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
