use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::{db_timestamp, SqliteDatabaseError},
    db_types::{DiscountCode, DiscountType, NewDiscountCode, OrderId},
};

const DISCOUNT_COLUMNS: &str =
    "id, code, email, discount_type, discount_value, expires_at, used, used_at, order_id, created_at";

#[derive(Debug, FromRow)]
struct DiscountRow {
    id: i64,
    code: String,
    email: String,
    discount_type: String,
    discount_value: String,
    expires_at: DateTime<Utc>,
    used: bool,
    used_at: Option<DateTime<Utc>>,
    order_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for DiscountCode {
    type Error = SqliteDatabaseError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        let discount_type = row
            .discount_type
            .parse::<DiscountType>()
            .map_err(|e| SqliteDatabaseError::CorruptRecord(format!("discount {}: {e}", row.id)))?;
        let discount_value = row
            .discount_value
            .parse::<Decimal>()
            .map_err(|e| SqliteDatabaseError::CorruptRecord(format!("discount {}: {e}", row.id)))?;
        Ok(DiscountCode {
            id: row.id,
            code: row.code,
            email: row.email,
            discount_type,
            discount_value,
            expires_at: row.expires_at,
            used: row.used,
            used_at: row.used_at,
            order_id: row.order_id.map(OrderId),
            created_at: row.created_at,
        })
    }
}

pub async fn insert_discount(
    discount: NewDiscountCode,
    conn: &mut SqliteConnection,
) -> Result<DiscountCode, SqliteDatabaseError> {
    let sql = format!(
        r#"
        INSERT INTO discount_codes (code, email, discount_type, discount_value, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {DISCOUNT_COLUMNS};
        "#
    );
    let row: DiscountRow = sqlx::query_as(&sql)
        .bind(discount.code)
        .bind(discount.email)
        .bind(discount.discount_type.to_string())
        .bind(discount.discount_value.to_string())
        .bind(db_timestamp(&discount.expires_at))
        .bind(db_timestamp(&Utc::now()))
        .fetch_one(conn)
        .await?;
    DiscountCode::try_from(row)
}

pub async fn fetch_discount(
    code: &str,
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<DiscountCode>, SqliteDatabaseError> {
    let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discount_codes WHERE code = $1 AND lower(email) = $2");
    let row: Option<DiscountRow> = sqlx::query_as(&sql).bind(code).bind(email).fetch_optional(conn).await?;
    row.map(DiscountCode::try_from).transpose()
}

/// Returns `true` if the code was unused and has now been marked as used.
pub async fn mark_used(
    code: &str,
    email: &str,
    now: &DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE discount_codes SET used = TRUE, used_at = $3 WHERE code = $1 AND lower(email) = $2 AND used = FALSE",
    )
    .bind(code)
    .bind(email)
    .bind(db_timestamp(now))
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Marks the code as used only if it is unused and unexpired at `now`, returning the updated record.
pub async fn redeem(
    code: &str,
    email: &str,
    now: &DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<DiscountCode>, SqliteDatabaseError> {
    let sql = format!(
        r#"
        UPDATE discount_codes SET used = TRUE, used_at = $3
        WHERE code = $1 AND lower(email) = $2 AND used = FALSE AND expires_at > $3
        RETURNING {DISCOUNT_COLUMNS};
        "#
    );
    let row: Option<DiscountRow> =
        sqlx::query_as(&sql).bind(code).bind(email).bind(db_timestamp(now)).fetch_optional(conn).await?;
    row.map(DiscountCode::try_from).transpose()
}

/// Spends the code on `order_id`. A code that was redeemed up front but not yet spent on an order can still be claimed
/// here, once. Returns `true` if this call attached the code to the order.
pub async fn claim_for_order(
    code: &str,
    email: &str,
    order_id: &OrderId,
    now: &DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE discount_codes SET used = TRUE, used_at = COALESCE(used_at, $4), order_id = $3
        WHERE code = $1 AND lower(email) = $2 AND order_id IS NULL AND expires_at > $4
        "#,
    )
    .bind(code)
    .bind(email)
    .bind(order_id.as_str())
    .bind(db_timestamp(now))
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
