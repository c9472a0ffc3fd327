//! # API Error Type
//!
//! What an operator sees when a back-office command fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in atelier-admin                          │
//! │                                                                         │
//! │  atelier-admin record-payment ...                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command handler  ──  Result<serde_json::Value, ApiError>        │  │
//! │  │         │                                                        │  │
//! │  │  DbError::Domain(CoreError) ── message kept verbatim ──┐         │  │
//! │  │         │                                              │         │  │
//! │  │  DbError::QueryFailed(..)  ── logged, generic text ────┤         │  │
//! │  │                                                        ▼         │  │
//! │  │                                              ApiError { code }   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stdout: {"code":"INVALID_INPUT","message":"... Maximum allowed: ..."} │
//! │  exit status 1                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use atelier_core::{CoreError, ErrorKind};
use atelier_db::DbError;
use serde::Serialize;

/// Error printed by a failed command.
///
/// ```json
/// {
///   "code": "PENDING_APPROVAL",
///   "message": "Your registration is pending approval"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes, one per [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InvalidInput,
    InvalidState,
    PendingApproval,
    Rejected,
    InvalidCredentials,
    StorageFailure,
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::InvalidInput => ErrorCode::InvalidInput,
            ErrorKind::InvalidState => ErrorCode::InvalidState,
            ErrorKind::PendingApproval => ErrorCode::PendingApproval,
            ErrorKind::Rejected => ErrorCode::Rejected,
            ErrorKind::InvalidCredentials => ErrorCode::InvalidCredentials,
            ErrorKind::StorageFailure => ErrorCode::StorageFailure,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::StorageFailure, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let code = ErrorCode::from(err.kind());
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { .. } | DbError::UniqueViolation { .. } => {
                ApiError::new(code, err.to_string())
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(code, "Invalid reference")
            }
            DbError::Conflict { entity, id } => {
                tracing::warn!(entity = %entity, id = %id, "Concurrent modification detected");
                ApiError::storage(format!(
                    "{} {} was modified concurrently, please retry",
                    entity, id
                ))
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::storage("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::storage("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::storage("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::storage("Database transaction failed")
            }
            DbError::PoolExhausted => ApiError::storage("Database pool exhausted"),
            DbError::Hashing(e) => {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::storage("Credential processing failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::storage("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
///
/// Domain messages are written for the operator and pass through as-is.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::new(err.kind().into(), err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::Money;

    #[test]
    fn test_domain_message_passes_through() {
        let err: ApiError = DbError::from(CoreError::PaymentExceedsBalance {
            balance: Money::from_cents(15_000),
        })
        .into();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.contains("150.00"));
    }

    #[test]
    fn test_storage_details_hidden() {
        let err: ApiError = DbError::QueryFailed("no such column: foo".to_string()).into();
        assert_eq!(err.code, ErrorCode::StorageFailure);
        assert!(!err.message.contains("foo"));
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::from(CoreError::PendingApproval);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "PENDING_APPROVAL");
        assert_eq!(json["message"], "Your registration is pending approval");
    }
}
