//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error ──► DbError (constraint / busy / pool categorisation)      │
//! │  CoreError   ──► DbError::Domain (validation, stock, not found)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← status code + {error, message} envelope          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockroom_core::{CoreError, ValidationError};
use thiserror::Error;

/// Ledger store errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A domain rule rejected the operation (validation, out of stock...).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate SKU
    /// - Inserting a duplicate order number
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// SQLite reported the database busy or locked.
    ///
    /// ## When This Occurs
    /// - Another writer held the lock past the busy timeout
    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and key.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Machine-readable error code shared by the API envelope and the
    /// import/bulk-delete outcome lists.
    pub fn kind(&self) -> &'static str {
        match self {
            DbError::Domain(e) => e.kind(),
            DbError::NotFound { .. } => "not_found",
            DbError::UniqueViolation { .. } => "duplicate_key",
            DbError::Conflict(_) => "conflicting_update",
            _ => "persistence_error",
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. } | DbError::Domain(CoreError::DuplicateKey { .. })
        )
    }

    /// Fills in the offending value on a constraint error parsed from SQLite,
    /// whose message only names the column.
    pub(crate) fn with_value(self, field: &str, value: &str) -> Self {
        match self {
            DbError::UniqueViolation { .. } => DbError::duplicate(field, value),
            other => other,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → constraint / busy analysis
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // SQLITE_BUSY = 5, SQLITE_LOCKED = 6 (extended codes keep the low byte)
                let busy = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| matches!(code & 0xff, 5 | 6))
                    .unwrap_or(false);

                if busy || msg.contains("database is locked") {
                    DbError::Conflict(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    // "UNIQUE constraint failed: <table>.<column>"
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .and_then(|col| col.rsplit('.').next())
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_domain_error() {
        let err: DbError = CoreError::OutOfStock {
            sku: "SKU-1".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.kind(), "out_of_stock");
        assert_eq!(
            err.to_string(),
            "Insufficient stock for SKU-1: available 1, requested 2"
        );

        assert_eq!(DbError::Conflict("busy".into()).kind(), "conflicting_update");
        assert_eq!(DbError::PoolExhausted.kind(), "persistence_error");
    }

    #[test]
    fn test_with_value_fills_duplicate() {
        let err = DbError::duplicate("order_number", "unknown").with_value("order_number", "A-1");
        assert_eq!(err.to_string(), "Duplicate order_number: 'A-1' already exists");
        assert!(err.is_unique_violation());
    }
}
