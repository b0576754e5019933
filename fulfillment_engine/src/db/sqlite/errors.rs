use thiserror::Error;

use crate::db::traits::StoreError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Stored record is invalid: {0}")]
    CorruptRecord(String),
}

impl From<serde_json::Error> for SqliteDatabaseError {
    fn from(e: serde_json::Error) -> Self {
        SqliteDatabaseError::CorruptRecord(e.to_string())
    }
}

impl From<SqliteDatabaseError> for StoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::CorruptRecord(s) => StoreError::CorruptRecord(s),
            e => StoreError::DatabaseError(e.to_string()),
        }
    }
}

/// True if the error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
