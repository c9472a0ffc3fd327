//! # Product Repository
//!
//! Products, the price calculator's writes and stock reconciliation.
//!
//! ## Stock Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WriteGate + BEGIN                                                      │
//! │       │                                                                 │
//! │       ├── SELECT every product id                                      │
//! │       ├── SELECT bills LEFT JOIN items                                 │
//! │       │     WHERE bill.status <> 'cancelled'                           │
//! │       │     ORDER BY bill.created_at, bill.rowid, item.position        │
//! │       │                                                                 │
//! │       ├── atelier_core::stock::reconcile(...)   (pure)                 │
//! │       │                                                                 │
//! │       ├── UPDATE products ... (one per product)                        │
//! │       ▼                                                                 │
//! │  COMMIT  ← nobody ever sees the intermediate zero state                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::WriteGate;
use crate::repository::next_slug;
use atelier_core::pricing::compute_price;
use atelier_core::stock::{self, BillStock, ReconcileSummary, StockLine};
use atelier_core::validation::{validate_name, validate_non_negative_cents};
use atelier_core::{BillStatus, CoreError, Markup, Money, PriceField, Product, StockStatus};

const PRODUCT_COLUMNS: &str = r#"
    id, name, slug, brand_id, category_id, size_id,
    cost_price_cents, wholesale_price_cents, reseller_price_cents, retail_price_cents,
    stock_quantity, status, created_at, updated_at, version
"#;

/// Input for [`ProductRepository::create`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub brand_id: Option<String>,
    pub category_id: Option<String>,
    pub size_id: Option<String>,
    pub cost_price: Money,
}

/// Result of [`ProductRepository::bulk_apply_price`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPriceSummary {
    pub updated_count: usize,
}

/// One row of the reconciliation read. Item columns are NULL for a bill
/// without items.
#[derive(Debug, sqlx::FromRow)]
struct BillItemRow {
    bill_id: String,
    product_id: Option<String>,
    quantity: Option<i64>,
    cost_price_cents: Option<i64>,
    final_cost_price_cents: Option<i64>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    gate: WriteGate,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, gate: WriteGate) -> Self {
        ProductRepository { pool, gate }
    }

    // -------------------------------------------------------------------------
    // CRUD
    // -------------------------------------------------------------------------

    /// Inserts a product.
    ///
    /// New products have no stock, and every sale price equals the cost
    /// until a markup is applied.
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        validate_name("product name", &input.name)?;
        validate_non_negative_cents("cost price", input.cost_price.cents())?;

        let now = Utc::now();
        let cost = input.cost_price.cents();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            slug: next_slug(&self.pool, "products", &input.name).await?,
            brand_id: input.brand_id,
            category_id: input.category_id,
            size_id: input.size_id,
            cost_price_cents: cost,
            wholesale_price_cents: cost,
            reseller_price_cents: cost,
            retail_price_cents: cost,
            stock_quantity: 0,
            status: StockStatus::OutOfStock,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        debug!(id = %product.id, slug = %product.slug, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, slug, brand_id, category_id, size_id,
                cost_price_cents, wholesale_price_cents, reseller_price_cents, retail_price_cents,
                stock_quantity, status, created_at, updated_at, version
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.brand_id)
        .bind(&product.category_id)
        .bind(&product.size_id)
        .bind(product.cost_price_cents)
        .bind(product.wholesale_price_cents)
        .bind(product.reseller_price_cents)
        .bind(product.retail_price_cents)
        .bind(product.stock_quantity)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.version)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a missing product is an error.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Lists products by name, optionally filtered by stock status.
    pub async fn list(&self, status: Option<StockStatus>) -> DbResult<Vec<Product>> {
        let products = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM products WHERE status = ?1 ORDER BY name, id",
                    PRODUCT_COLUMNS
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM products ORDER BY name, id", PRODUCT_COLUMNS);
                sqlx::query_as::<_, Product>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(products)
    }

    /// Deletes a product.
    ///
    /// A product still referenced by purchase items cannot be deleted
    /// (foreign key violation). Storefront entries go with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let _gate = self.gate.acquire().await;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        debug!(id = %id, "Deleted product");
        Ok(())
    }

    /// Number of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Computes a price from the product's cost and writes it to one field.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the product doesn't exist
    /// - `NegativePrice` if the markup would take the price below zero
    pub async fn apply_price(
        &self,
        product_id: &str,
        markup: Markup,
        field: PriceField,
    ) -> DbResult<Product> {
        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let cost: i64 = sqlx::query_scalar("SELECT cost_price_cents FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let price = compute_price(Money::from_cents(cost), markup)?;

        let sql = format!(
            "UPDATE products SET {} = ?2, updated_at = ?3, version = version + 1 WHERE id = ?1",
            price_column(field)
        );
        sqlx::query(&sql)
            .bind(product_id)
            .bind(price.cents())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product_id = %product_id,
            field = %field,
            markup = %markup,
            cost = %Money::from_cents(cost),
            price = %price,
            "Applied price"
        );

        Ok(product)
    }

    /// Applies one markup to every product's cost, written unconditionally.
    ///
    /// All or nothing: if any product would end up with a negative price,
    /// no product is changed.
    pub async fn bulk_apply_price(&self, markup: Markup, field: PriceField) -> DbResult<BulkPriceSummary> {
        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let costs: Vec<(String, i64)> =
            sqlx::query_as("SELECT id, cost_price_cents FROM products ORDER BY id")
                .fetch_all(&mut *tx)
                .await?;

        let now = Utc::now();
        let sql = format!(
            "UPDATE products SET {} = ?2, updated_at = ?3, version = version + 1 WHERE id = ?1",
            price_column(field)
        );

        for (id, cost) in &costs {
            let price = compute_price(Money::from_cents(*cost), markup)?;
            sqlx::query(&sql)
                .bind(id)
                .bind(price.cents())
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(field = %field, markup = %markup, updated = costs.len(), "Applied bulk price");

        Ok(BulkPriceSummary {
            updated_count: costs.len(),
        })
    }

    // -------------------------------------------------------------------------
    // Stock
    // -------------------------------------------------------------------------

    /// Recomputes quantity, cost and status of every product from the
    /// non-cancelled purchase bills, in one transaction.
    ///
    /// Products without live purchase items end at 0 / out_of_stock and
    /// keep their last cost.
    pub async fn reconcile_stock(&self) -> DbResult<ReconcileSummary> {
        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let product_ids: Vec<String> = sqlx::query_scalar("SELECT id FROM products")
            .fetch_all(&mut *tx)
            .await?;

        let rows = sqlx::query_as::<_, BillItemRow>(
            r#"
            SELECT
                b.id AS bill_id,
                i.product_id,
                i.quantity,
                i.cost_price_cents,
                i.final_cost_price_cents
            FROM purchase_bills b
            LEFT JOIN purchase_items i ON i.bill_id = b.id
            WHERE b.status <> 'cancelled'
            ORDER BY b.created_at, b.rowid, i.position
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let bills = group_bill_rows(rows);
        let reconciliation = stock::reconcile(product_ids.iter().map(String::as_str), &bills);

        let now = Utc::now();
        for level in &reconciliation.levels {
            match level.cost_price {
                Some(cost) => {
                    sqlx::query(
                        r#"
                        UPDATE products SET
                            stock_quantity = ?2,
                            status = ?3,
                            cost_price_cents = ?4,
                            updated_at = ?5,
                            version = version + 1
                        WHERE id = ?1
                        "#,
                    )
                    .bind(&level.product_id)
                    .bind(level.quantity)
                    .bind(level.status)
                    .bind(cost.cents())
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        r#"
                        UPDATE products SET
                            stock_quantity = ?2,
                            status = ?3,
                            updated_at = ?4,
                            version = version + 1
                        WHERE id = ?1
                        "#,
                    )
                    .bind(&level.product_id)
                    .bind(level.quantity)
                    .bind(level.status)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let summary = reconciliation.summary();
        info!(
            products = reconciliation.levels.len(),
            updated_products = summary.updated_product_count,
            contributing_bills = summary.contributing_bill_count,
            "Reconciled stock"
        );

        Ok(summary)
    }
}

/// Column a price field is stored in.
fn price_column(field: PriceField) -> &'static str {
    match field {
        PriceField::Wholesale => "wholesale_price_cents",
        PriceField::Reseller => "reseller_price_cents",
        PriceField::Retail => "retail_price_cents",
    }
}

/// Folds the ordered join rows back into bills, preserving order.
fn group_bill_rows(rows: Vec<BillItemRow>) -> Vec<BillStock> {
    let mut bills: Vec<BillStock> = Vec::new();

    for row in rows {
        if bills.last().map(|b| b.bill_id != row.bill_id).unwrap_or(true) {
            bills.push(BillStock {
                bill_id: row.bill_id.clone(),
                status: BillStatus::Pending,
                lines: Vec::new(),
            });
        }

        if let (Some(product_id), Some(quantity), Some(cost)) =
            (row.product_id, row.quantity, row.cost_price_cents)
        {
            if let Some(bill) = bills.last_mut() {
                bill.lines.push(StockLine {
                    product_id,
                    quantity,
                    cost_price: Money::from_cents(cost),
                    final_cost_price: row.final_cost_price_cents.map(Money::from_cents),
                });
            }
        }
    }

    bills
}

// =============================================================================
// Unit Tests
// =============================================================================
