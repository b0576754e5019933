//! SQLite backend for the order store.
pub mod db;
mod errors;

pub mod discounts;
pub mod orders;
pub mod paid_orders;

use std::{env, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
pub use db::SqliteDatabase;
pub use errors::SqliteDatabaseError;
pub(crate) use errors::is_unique_violation;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

const SQLITE_DB_URL: &str = "sqlite://data/dd_store.db";

pub fn db_url() -> String {
    let result = env::var("DD_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ DD_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Timestamps are stored as fixed-width RFC 3339 strings so that SQL string comparisons order them correctly.
pub(crate) fn db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}
