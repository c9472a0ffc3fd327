//! # Error Types
//!
//! Domain-specific error types for atelier-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  atelier-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Caller-facing taxonomy both map onto           │
//! │                                                                         │
//! │  atelier-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures (+ wrapped CoreError)         │
//! │                                                                         │
//! │  Back-office errors (in app)                                           │
//! │  └── ApiError         - What the operator sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PartnerType, RegistrationStatus};

// =============================================================================
// Error Kind
// =============================================================================

/// The caller-facing error taxonomy.
///
/// Every error the core or the storage layer produces maps to exactly one
/// kind, so callers can branch without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorKind {
    /// Referenced bill, product or partner does not exist.
    NotFound,
    /// Missing or malformed fields, unknown enum values, non-positive
    /// amounts, amounts exceeding the balance.
    InvalidInput,
    /// Transition attempted from a state that does not allow it.
    InvalidState,
    /// Authentication blocked: registration not yet approved.
    PendingApproval,
    /// Authentication blocked: registration was rejected.
    Rejected,
    /// Unknown identifier or wrong password (deliberately indistinguishable).
    InvalidCredentials,
    /// The store is unreachable or a write did not commit.
    StorageFailure,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Purchase bill cannot be found.
    #[error("Purchase bill not found: {0}")]
    BillNotFound(String),

    /// Channel partner cannot be found.
    #[error("{partner_type} not found: {id}")]
    PartnerNotFound {
        partner_type: PartnerType,
        id: String,
    },

    /// Markup type is neither `percentage` nor `fixed`.
    #[error("Unknown markup type '{0}': expected 'percentage' or 'fixed'")]
    UnknownMarkupType(String),

    /// Applying the markup would produce a negative price.
    #[error("Computed price {computed} is negative")]
    NegativePrice { computed: Money },

    /// Payment mode is not one of the recognized modes.
    #[error("Unknown payment mode '{0}'")]
    UnknownPaymentMode(String),

    /// Payment exceeds what is still owed on the bill.
    ///
    /// ## User Workflow
    /// ```text
    /// Bill total 1000.00, already paid 850.00
    ///      │
    ///      ▼
    /// Record payment of 200.00
    ///      │
    ///      ▼
    /// PaymentExceedsBalance { balance: 150.00 }
    ///      │
    ///      ▼
    /// UI shows: "... Maximum allowed: 150.00"
    /// ```
    #[error("Payment amount exceeds the outstanding balance. Maximum allowed: {balance}")]
    PaymentExceedsBalance { balance: Money },

    /// Payment attempted against a cancelled bill.
    #[error("Purchase bill {0} is cancelled and cannot accept payments")]
    BillCancelled(String),

    /// Cancel attempted on a bill that is already cancelled.
    #[error("Purchase bill {0} is already cancelled")]
    BillAlreadyCancelled(String),

    /// Approve/reject attempted from a terminal registration state.
    #[error("Cannot {action} a registration that is already {current}")]
    InvalidRegistrationTransition {
        action: &'static str,
        current: RegistrationStatus,
    },

    /// Operation requires an approved partner.
    #[error("{partner_type} {id} is not approved (registration is {current})")]
    PartnerNotApproved {
        partner_type: PartnerType,
        id: String,
        current: RegistrationStatus,
    },

    /// Login refused: registration still pending.
    #[error("Your registration is pending approval")]
    PendingApproval,

    /// Login refused: registration was rejected.
    #[error("Your registration has been rejected")]
    Rejected,

    /// Login refused: approved account was deactivated.
    #[error("Your account is inactive")]
    AccountInactive,

    /// Login refused: unknown identifier or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Maps this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::BillNotFound(_)
            | CoreError::PartnerNotFound { .. } => ErrorKind::NotFound,

            CoreError::UnknownMarkupType(_)
            | CoreError::NegativePrice { .. }
            | CoreError::UnknownPaymentMode(_)
            | CoreError::PaymentExceedsBalance { .. }
            | CoreError::BillCancelled(_)
            | CoreError::BillAlreadyCancelled(_)
            | CoreError::Validation(_) => ErrorKind::InvalidInput,

            CoreError::InvalidRegistrationTransition { .. }
            | CoreError::PartnerNotApproved { .. }
            | CoreError::AccountInactive => ErrorKind::InvalidState,

            CoreError::PendingApproval => ErrorKind::PendingApproval,
            CoreError::Rejected => ErrorKind::Rejected,
            CoreError::InvalidCredentials => ErrorKind::InvalidCredentials,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, malformed decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., a product listed twice in one bill).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
