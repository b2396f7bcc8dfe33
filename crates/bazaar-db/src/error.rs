//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← classified by SQLSTATE                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller (repository user / binary)                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Not-found is never an error here: lookups return `Option`.

use bazaar_core::ValidationError;
use thiserror::Error;

use crate::config::ConfigError;

/// SQLSTATE `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE `check_violation`.
const CHECK_VIOLATION: &str = "23514";
/// SQLSTATE `not_null_violation`.
const NOT_NULL_VIOLATION: &str = "23502";
/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";
/// SQLSTATE `string_data_right_truncation`.
const STRING_TOO_LONG: &str = "22001";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A row the statement depended on was missing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique / primary key constraint violation.
    #[error("Unique violation on {constraint}: {message}")]
    UniqueViolation { constraint: String, message: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - `referred_id` points at a user that doesn't exist
    /// - Creating an order for an unknown user
    /// - Linking an unknown order or product
    #[error("Foreign key violation on {constraint}: {message}")]
    ForeignKeyViolation { constraint: String, message: String },

    /// CHECK / NOT NULL / range violation raised by the store.
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Input rejected before reaching the store.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Connection settings that no pool can be built from.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Database unreachable or connection dropped.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin / commit / rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use past the acquire timeout).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns true for constraint violations raised by the store.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation { .. }
        )
    }

    /// Maps a Postgres error report to a `DbError` by SQLSTATE.
    ///
    /// ## Error Mapping
    /// ```text
    /// 23503                  → ForeignKeyViolation
    /// 23505                  → UniqueViolation
    /// 23514 / 23502 / 22003  → CheckViolation
    /// 22001                  → CheckViolation
    /// anything else          → QueryFailed
    /// ```
    pub fn from_sqlstate(code: Option<&str>, constraint: Option<&str>, message: &str) -> Self {
        let constraint = constraint.unwrap_or("unknown").to_string();
        let message = message.to_string();

        match code {
            Some(FOREIGN_KEY_VIOLATION) => DbError::ForeignKeyViolation { constraint, message },
            Some(UNIQUE_VIOLATION) => DbError::UniqueViolation { constraint, message },
            Some(CHECK_VIOLATION | NOT_NULL_VIOLATION | NUMERIC_OUT_OF_RANGE | STRING_TOO_LONG) => {
                DbError::CheckViolation { message }
            }
            _ => DbError::QueryFailed(message),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → by SQLSTATE (see from_sqlstate)
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// PoolClosed / Io / Tls       → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let code = db_err.code();
                DbError::from_sqlstate(code.as_deref(), db_err.constraint(), db_err.message())
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            sqlx::Error::Tls(e) => DbError::ConnectionFailed(e.to_string()),

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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_key_violation() {
        let err = DbError::from_sqlstate(
            Some("23503"),
            Some("users_referred_id_fkey"),
            "insert or update on table \"users\" violates foreign key constraint",
        );
        match err {
            DbError::ForeignKeyViolation { constraint, .. } => {
                assert_eq!(constraint, "users_referred_id_fkey")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unique_violation() {
        let err = DbError::from_sqlstate(Some("23505"), Some("order_products_pkey"), "dup");
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_check_family() {
        for code in ["23514", "23502", "22003", "22001"] {
            let err = DbError::from_sqlstate(Some(code), None, "bad value");
            assert!(matches!(err, DbError::CheckViolation { .. }), "{code}");
        }
    }

    #[test]
    fn test_unknown_code_is_query_failure() {
        let err = DbError::from_sqlstate(Some("42P01"), None, "relation does not exist");
        assert!(matches!(err, DbError::QueryFailed(_)));
        assert!(!err.is_constraint_violation());

        let err = DbError::from_sqlstate(None, None, "no code");
        assert!(matches!(err, DbError::QueryFailed(_)));
    }

    #[test]
    fn test_sqlx_pool_errors() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionFailed(_)
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
    }

    #[test]
    fn test_validation_converts() {
        let err: DbError = ValidationError::required("title").into();
        assert_eq!(err.to_string(), "Validation failed: title is required");
    }
}
