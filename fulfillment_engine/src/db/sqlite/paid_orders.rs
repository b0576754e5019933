use chrono::{DateTime, Utc};
use dd_common::Money;
use log::{debug, warn};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::{
        sqlite::{db_timestamp, is_unique_violation, SqliteDatabaseError},
        traits::InsertPaidOrderResult,
    },
    db_types::{NewPaidOrder, OrderId, PaidOrder, PaymentProvider, ShippingAddress, TrackingInfo},
};

const PAID_ORDER_COLUMNS: &str = "id, original_order_id, provider, payment_id, capture_id, amount, currency, items, \
                                  customer_email, shipping_address, tracking_number, tracking_url, tracking_status, \
                                  estimated_delivery, label_url, packing_slip_url, created_at, updated_at";

#[derive(Debug, FromRow)]
struct PaidOrderRow {
    id: i64,
    original_order_id: String,
    provider: String,
    payment_id: String,
    capture_id: Option<String>,
    amount: Money,
    currency: String,
    items: String,
    customer_email: Option<String>,
    shipping_address: Option<String>,
    tracking_number: Option<String>,
    tracking_url: Option<String>,
    tracking_status: Option<String>,
    estimated_delivery: Option<String>,
    label_url: Option<String>,
    packing_slip_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaidOrderRow> for PaidOrder {
    type Error = SqliteDatabaseError;

    fn try_from(row: PaidOrderRow) -> Result<Self, Self::Error> {
        let provider = row
            .provider
            .parse::<PaymentProvider>()
            .map_err(|e| SqliteDatabaseError::CorruptRecord(format!("paid order {}: {e}", row.id)))?;
        let shipping_address =
            row.shipping_address.as_deref().map(serde_json::from_str::<ShippingAddress>).transpose()?;
        Ok(PaidOrder {
            id: row.id,
            original_order_id: OrderId(row.original_order_id),
            provider,
            payment_id: row.payment_id,
            capture_id: row.capture_id,
            amount: row.amount,
            currency: row.currency,
            items: serde_json::from_str(&row.items)?,
            customer_email: row.customer_email,
            shipping_address,
            tracking_number: row.tracking_number,
            tracking_url: row.tracking_url,
            tracking_status: row.tracking_status,
            estimated_delivery: row.estimated_delivery,
            label_url: row.label_url,
            packing_slip_url: row.packing_slip_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts the paid-order snapshot, unless one already exists for the order or for the same provider payment. In that
/// case the existing record is returned and nothing is written.
pub async fn idempotent_insert(
    paid_order: NewPaidOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertPaidOrderResult, SqliteDatabaseError> {
    if let Some(existing) = fetch_existing(&paid_order, conn).await? {
        debug!("🗃️ Paid order for {} already exists (#{})", paid_order.original_order_id, existing.id);
        return Ok(InsertPaidOrderResult::AlreadyExists(existing));
    }
    match insert(&paid_order, conn).await {
        Ok(p) => Ok(InsertPaidOrderResult::Inserted(p)),
        Err(SqliteDatabaseError::DriverError(e)) if is_unique_violation(&e) => {
            warn!("🗃️ Concurrent paid order insert for {} detected", paid_order.original_order_id);
            let existing = fetch_existing(&paid_order, conn).await?.ok_or(SqliteDatabaseError::DriverError(e))?;
            Ok(InsertPaidOrderResult::AlreadyExists(existing))
        },
        Err(e) => Err(e),
    }
}

async fn insert(paid_order: &NewPaidOrder, conn: &mut SqliteConnection) -> Result<PaidOrder, SqliteDatabaseError> {
    let items = serde_json::to_string(&paid_order.items)?;
    let address = paid_order.shipping_address.as_ref().map(serde_json::to_string).transpose()?;
    let now = db_timestamp(&Utc::now());
    let sql = format!(
        r#"
        INSERT INTO paid_orders (
            original_order_id,
            provider,
            payment_id,
            capture_id,
            amount,
            currency,
            items,
            customer_email,
            shipping_address,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {PAID_ORDER_COLUMNS};
        "#
    );
    let row: PaidOrderRow = sqlx::query_as(&sql)
        .bind(paid_order.original_order_id.as_str())
        .bind(paid_order.provider.to_string())
        .bind(paid_order.payment_id.as_str())
        .bind(paid_order.capture_id.as_deref())
        .bind(paid_order.amount)
        .bind(paid_order.currency.as_str())
        .bind(items)
        .bind(paid_order.customer_email.as_deref())
        .bind(address)
        .bind(now)
        .fetch_one(conn)
        .await?;
    PaidOrder::try_from(row)
}

async fn fetch_existing(
    paid_order: &NewPaidOrder,
    conn: &mut SqliteConnection,
) -> Result<Option<PaidOrder>, SqliteDatabaseError> {
    let sql = format!(
        "SELECT {PAID_ORDER_COLUMNS} FROM paid_orders WHERE original_order_id = $1 OR (provider = $2 AND payment_id = \
         $3) LIMIT 1"
    );
    let row: Option<PaidOrderRow> = sqlx::query_as(&sql)
        .bind(paid_order.original_order_id.as_str())
        .bind(paid_order.provider.to_string())
        .bind(paid_order.payment_id.as_str())
        .fetch_optional(conn)
        .await?;
    row.map(PaidOrder::try_from).transpose()
}

pub async fn fetch_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<PaidOrder>, SqliteDatabaseError> {
    let sql = format!("SELECT {PAID_ORDER_COLUMNS} FROM paid_orders WHERE original_order_id = $1");
    let row: Option<PaidOrderRow> = sqlx::query_as(&sql).bind(order_id.as_str()).fetch_optional(conn).await?;
    row.map(PaidOrder::try_from).transpose()
}

pub(crate) async fn update_tracking(
    order_id: &OrderId,
    tracking: &TrackingInfo,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE paid_orders SET
            tracking_number = $2,
            tracking_url = $3,
            tracking_status = $4,
            estimated_delivery = $5,
            label_url = $6,
            packing_slip_url = COALESCE($7, packing_slip_url),
            updated_at = $8
        WHERE original_order_id = $1
        "#,
    )
    .bind(order_id.as_str())
    .bind(tracking.tracking_number.as_deref())
    .bind(tracking.tracking_url.as_deref())
    .bind(tracking.tracking_status.as_str())
    .bind(tracking.estimated_delivery.as_deref())
    .bind(tracking.label_url.as_deref())
    .bind(tracking.packing_slip_url.as_deref())
    .bind(db_timestamp(&Utc::now()))
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
