//! # Repository Module
//!
//! Database repository implementations for Atelier.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  atelier-admin command                                                 │
//! │       │                                                                 │
//! │       │  db.purchases().record_payment(bill_id, amount, mode, None)    │
//! │       ▼                                                                 │
//! │  PurchaseRepository                                                    │
//! │  ├── acquire WriteGate                                                 │
//! │  ├── BEGIN                                                             │
//! │  ├── read rows ──► atelier-core decides (ledger::apply_payment)        │
//! │  ├── write rows                                                        │
//! │  └── COMMIT   (any `?` before this drops the tx = ROLLBACK)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Brands, categories, sizes, vendors
//! - [`product::ProductRepository`] - Products, pricing, stock reconciliation
//! - [`purchase::PurchaseRepository`] - Purchase bills and payments
//! - [`partner::PartnerRepository`] - Partner registration and login
//! - [`reseller_store::ResellerStoreRepository`] - Reseller storefronts

pub mod catalog;
pub mod partner;
pub mod product;
pub mod purchase;
pub mod reseller_store;

use std::collections::HashSet;

use atelier_core::slug;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Picks a free slug for `name` in `table`.
///
/// The UNIQUE index still has the final say if two inserts race.
pub(crate) async fn next_slug(pool: &SqlitePool, table: &'static str, name: &str) -> DbResult<String> {
    let base = slug::base_slug(name);
    let sql = format!(
        "SELECT slug FROM {} WHERE slug = ?1 OR slug LIKE ?1 || '-%'",
        table
    );

    let existing: HashSet<String> = sqlx::query_scalar::<_, String>(&sql)
        .bind(&base)
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

    Ok(slug::unique_slug(name, |candidate| existing.contains(candidate)))
}
