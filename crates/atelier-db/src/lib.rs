//! # atelier-db: Database Layer for Atelier
//!
//! Every SQL statement and every transaction boundary of the marketplace
//! back-end lives here. Storage is SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Atelier Data Flow                                │
//! │                                                                         │
//! │  atelier-admin reconcile-stock                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    atelier-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo    │    │ 001_initial  │  │   │
//! │  │   │ WriteGate     │    │ PurchaseRepo   │    │   _schema    │  │   │
//! │  │   │               │    │ PartnerRepo    │    │              │  │   │
//! │  │   │               │    │ ResellerStore  │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │             decisions delegated to atelier-core                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write gate, repository accessors
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`password`] - Argon2 hashing for partner credentials
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use atelier_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./atelier.db")).await?;
//!
//! let summary = db.products().reconcile_stock().await?;
//! println!("{} products updated", summary.updated_product_count);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig, WriteGate};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::partner::{NewPartner, PartnerRepository};
pub use repository::product::{BulkPriceSummary, NewProduct, ProductRepository};
pub use repository::purchase::{
    BillDetail, NewPurchaseBill, NewPurchaseItem, PaymentRecord, PurchaseRepository,
};
pub use repository::reseller_store::ResellerStoreRepository;
