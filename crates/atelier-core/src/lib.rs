//! # atelier-core: Pure Business Logic for Atelier
//!
//! Pricing, stock reconciliation, the purchase-bill payment ledger and the
//! partner registration workflow. Everything here is a pure function over
//! plain data; `atelier-db` supplies the data and persists the results.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atelier Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           atelier-admin (back-office CLI)                       │   │
//! │  │   reconcile-stock, apply-price, record-payment, approve, ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               atelier-db (transactions, SQLite)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ plain data in, decisions out           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ atelier-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────────┐         │   │
//! │  │   │ pricing │ │  stock  │ │ ledger  │ │ registration │         │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────────┘         │   │
//! │  │   money • types • error • validation • slug • expenses         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cents Money with banker's rounding
//! - [`types`] - Domain types (Product, PurchaseBill, PartnerAccount, ...)
//! - [`error`] - Domain errors and the caller-facing [`ErrorKind`]
//! - [`validation`] - Field rules
//! - [`pricing`] - Markup rules and price computation
//! - [`stock`] - Full stock/cost recompute from purchase bills
//! - [`ledger`] - Bill balance accounting
//! - [`expenses`] - Landed cost per purchase line
//! - [`registration`] - Partner approval state machine and login gate
//! - [`slug`] - Slugs and username suggestions
//!
//! ## Example Usage
//!
//! ```rust
//! use atelier_core::money::Money;
//! use atelier_core::pricing::{compute_price, Markup};
//!
//! let cost = Money::from_cents(10_000);
//! let price = compute_price(cost, Markup::parse("percentage", "20").unwrap()).unwrap();
//! assert_eq!(price.cents(), 12_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod expenses;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod registration;
pub mod slug;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use pricing::{Markup, MarkupType, PriceField};
pub use registration::Approvable;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single purchase line.
///
/// Catches typos like 1000 instead of 10 on an invoice.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 32;

pub const MIN_PASSWORD_LENGTH: usize = 8;
