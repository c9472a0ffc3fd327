//! # Storage Errors
//!
//! [`DbError`] is what every repository returns. A rule rejected inside a
//! transaction arrives as [`DbError::Domain`] and keeps its [`ErrorKind`];
//! everything SQLite or the pool reports is folded into the remaining
//! variants and surfaces as [`ErrorKind::StorageFailure`] unless it is a
//! missing row or a constraint the caller tripped.
//!
//! ```text
//!   CoreError ─────────────┐
//!   ValidationError ───────┤
//!                          ▼
//!   sqlx::Error ──────► DbError ──► kind() ──► back-office ApiError
//!   MigrateError ──────────┘
//! ```

use atelier_core::{CoreError, ErrorKind, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Rejected by a business rule; the surrounding transaction rolled back.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index refused the row, e.g. a second product with the same slug.
    #[error("Duplicate value for {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A guarded UPDATE matched no row: the version or status moved on.
    #[error("Concurrent modification of {entity} {id}")]
    Conflict { entity: String, id: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// BEGIN or COMMIT itself failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Maps this error onto the caller-facing taxonomy.
    ///
    /// ```text
    /// Domain(e)                    → e.kind()
    /// NotFound                     → NotFound
    /// UniqueViolation / FK         → InvalidInput
    /// everything else              → StorageFailure
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Domain(err) => err.kind(),
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ErrorKind::InvalidInput
            }
            DbError::Conflict { .. }
            | DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::PoolExhausted
            | DbError::Hashing(_)
            | DbError::Internal(_) => ErrorKind::StorageFailure,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind as SqlxKind;

        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                SqlxKind::UniqueViolation => DbError::UniqueViolation {
                    // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                    constraint: db_err
                        .message()
                        .rsplit(": ")
                        .next()
                        .unwrap_or("unknown")
                        .to_string(),
                },
                SqlxKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::Money;

    #[test]
    fn test_domain_errors_keep_their_kind() {
        let err: DbError = CoreError::PaymentExceedsBalance {
            balance: Money::from_cents(0),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            err.to_string(),
            "Payment amount exceeds the outstanding balance. Maximum allowed: 0.00"
        );

        let err: DbError = CoreError::PendingApproval.into();
        assert_eq!(err.kind(), ErrorKind::PendingApproval);
    }

    #[test]
    fn test_storage_errors_are_storage_failures() {
        assert_eq!(DbError::PoolExhausted.kind(), ErrorKind::StorageFailure);
        assert_eq!(
            DbError::conflict("purchase bill", "b-1").kind(),
            ErrorKind::StorageFailure
        );
        assert_eq!(DbError::not_found("product", "p-1").kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_sqlite_constraint_errors_are_classified() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query("CREATE TABLE slugs (slug TEXT NOT NULL UNIQUE)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO slugs (slug) VALUES ('oxford')")
            .execute(&pool)
            .await
            .unwrap();

        let err: DbError = sqlx::query("INSERT INTO slugs (slug) VALUES ('oxford')")
            .execute(&pool)
            .await
            .unwrap_err()
            .into();
        match &err {
            DbError::UniqueViolation { constraint } => assert_eq!(constraint, "slugs.slug"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err: DbError = sqlx::query("SELECT * FROM missing_table")
            .execute(&pool)
            .await
            .unwrap_err()
            .into();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
