//! # Reseller Store Repository
//!
//! Approved resellers import catalog products into their own storefront,
//! optionally override the selling price, hide entries and reorder them.
//!
//! ## Price Resolution
//! ```text
//! reseller_products.selling_price_cents ──┐
//!                                         ├──► COALESCE ──► storefront price
//! products.reseller_price_cents ──────────┘
//! ```
//! Clearing the override falls back to the product's reseller price, so a
//! later bulk price change on the catalog flows through automatically.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::WriteGate;
use crate::repository::partner::select_account;
use atelier_core::validation::validate_non_negative_cents;
use atelier_core::{
    AccountStatus, Approvable, CoreError, Money, PartnerAccount, PartnerType, ResellerProduct,
    StorefrontEntry, ValidationError,
};

const ENTRY_COLUMNS: &str = r#"
    id, reseller_id, product_id, selling_price_cents, is_visible, display_order,
    created_at, updated_at
"#;

/// Repository for reseller storefront entries.
#[derive(Debug, Clone)]
pub struct ResellerStoreRepository {
    pool: SqlitePool,
    gate: WriteGate,
}

impl ResellerStoreRepository {
    /// Creates a new ResellerStoreRepository.
    pub fn new(pool: SqlitePool, gate: WriteGate) -> Self {
        ResellerStoreRepository { pool, gate }
    }

    async fn load_reseller<'e, E>(executor: E, reseller_id: &str) -> DbResult<PartnerAccount>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let sql = format!("{} WHERE id = ?1", select_account(PartnerType::Reseller));
        sqlx::query_as::<_, PartnerAccount>(&sql)
            .bind(reseller_id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| {
                CoreError::PartnerNotFound {
                    partner_type: PartnerType::Reseller,
                    id: reseller_id.to_string(),
                }
                .into()
            })
    }

    /// Adds a product to the reseller's store, or updates its price override
    /// if it is already there.
    ///
    /// New entries are visible and go to the end of the display order.
    /// Re-importing keeps the existing visibility and position.
    ///
    /// ## Errors
    /// - `PartnerNotFound` / `PartnerNotApproved` for the reseller
    /// - `ProductNotFound`
    pub async fn import_product(
        &self,
        reseller_id: &str,
        product_id: &str,
        selling_price: Option<Money>,
    ) -> DbResult<ResellerProduct> {
        if let Some(price) = selling_price {
            validate_non_negative_cents("selling price", price.cents())?;
        }

        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let reseller = Self::load_reseller(&mut *tx, reseller_id).await?;
        reseller.ensure_approved()?;

        let product: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?;
        if product.is_none() {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO reseller_products (
                id, reseller_id, product_id, selling_price_cents, is_visible,
                display_order, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, 1,
                (SELECT COALESCE(MAX(display_order) + 1, 0)
                   FROM reseller_products WHERE reseller_id = ?2),
                ?5, ?5
            )
            ON CONFLICT(reseller_id, product_id) DO UPDATE SET
                selling_price_cents = excluded.selling_price_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(reseller_id)
        .bind(product_id)
        .bind(selling_price.map(|p| p.cents()))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {} FROM reseller_products WHERE reseller_id = ?1 AND product_id = ?2",
            ENTRY_COLUMNS
        );
        let entry = sqlx::query_as::<_, ResellerProduct>(&sql)
            .bind(reseller_id)
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            reseller_id = %reseller_id,
            product_id = %product_id,
            display_order = entry.display_order,
            "Product imported into storefront"
        );

        Ok(entry)
    }

    /// Shows or hides one entry.
    pub async fn set_visibility(
        &self,
        reseller_id: &str,
        product_id: &str,
        visible: bool,
    ) -> DbResult<ResellerProduct> {
        let _gate = self.gate.acquire().await;

        let result = sqlx::query(
            r#"
            UPDATE reseller_products SET is_visible = ?3, updated_at = ?4
            WHERE reseller_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(reseller_id)
        .bind(product_id)
        .bind(visible)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Storefront entry", product_id));
        }

        debug!(reseller_id = %reseller_id, product_id = %product_id, visible = visible, "Visibility changed");
        self.get_entry(reseller_id, product_id).await
    }

    /// Sets or clears (`None`) the price override.
    pub async fn set_selling_price(
        &self,
        reseller_id: &str,
        product_id: &str,
        selling_price: Option<Money>,
    ) -> DbResult<ResellerProduct> {
        if let Some(price) = selling_price {
            validate_non_negative_cents("selling price", price.cents())?;
        }

        let _gate = self.gate.acquire().await;

        let result = sqlx::query(
            r#"
            UPDATE reseller_products SET selling_price_cents = ?3, updated_at = ?4
            WHERE reseller_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(reseller_id)
        .bind(product_id)
        .bind(selling_price.map(|p| p.cents()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Storefront entry", product_id));
        }

        self.get_entry(reseller_id, product_id).await
    }

    /// Rewrites the display order: `product_ids[i]` gets position `i`.
    ///
    /// Every id must already be in the store. Entries not listed keep their
    /// position. All or nothing.
    pub async fn reorder(&self, reseller_id: &str, product_ids: &[String]) -> DbResult<()> {
        let mut seen = HashSet::new();
        for product_id in product_ids {
            if !seen.insert(product_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "product_id".to_string(),
                    value: product_id.clone(),
                }
                .into());
            }
        }

        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for (position, product_id) in product_ids.iter().enumerate() {
            let result = sqlx::query(
                r#"
                UPDATE reseller_products SET display_order = ?3, updated_at = ?4
                WHERE reseller_id = ?1 AND product_id = ?2
                "#,
            )
            .bind(reseller_id)
            .bind(product_id)
            .bind(position as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // tx drops here: ROLLBACK
                return Err(DbError::not_found("Storefront entry", product_id.as_str()));
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(reseller_id = %reseller_id, count = product_ids.len(), "Storefront reordered");
        Ok(())
    }

    async fn get_entry(&self, reseller_id: &str, product_id: &str) -> DbResult<ResellerProduct> {
        let sql = format!(
            "SELECT {} FROM reseller_products WHERE reseller_id = ?1 AND product_id = ?2",
            ENTRY_COLUMNS
        );
        sqlx::query_as::<_, ResellerProduct>(&sql)
            .bind(reseller_id)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Storefront entry", product_id))
    }

    /// Every entry, hidden ones included, in display order.
    pub async fn list(&self, reseller_id: &str) -> DbResult<Vec<ResellerProduct>> {
        let sql = format!(
            "SELECT {} FROM reseller_products WHERE reseller_id = ?1 ORDER BY display_order, created_at",
            ENTRY_COLUMNS
        );
        let entries = sqlx::query_as::<_, ResellerProduct>(&sql)
            .bind(reseller_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// The public view: visible entries with their resolved price.
    ///
    /// ## Errors
    /// - `PartnerNotFound`
    /// - `PartnerNotApproved` / `AccountInactive` while the store is closed
    pub async fn storefront(&self, reseller_id: &str) -> DbResult<Vec<StorefrontEntry>> {
        let reseller = Self::load_reseller(&self.pool, reseller_id).await?;
        reseller.ensure_approved()?;
        if reseller.status == AccountStatus::Inactive {
            return Err(CoreError::AccountInactive.into());
        }

        let entries = sqlx::query_as::<_, StorefrontEntry>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                p.slug,
                COALESCE(rp.selling_price_cents, p.reseller_price_cents) AS price_cents,
                p.status,
                rp.display_order
            FROM reseller_products rp
            JOIN products p ON p.id = rp.product_id
            WHERE rp.reseller_id = ?1 AND rp.is_visible = 1
            ORDER BY rp.display_order, rp.created_at
            "#,
        )
        .bind(reseller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::partner::NewPartner;
    use crate::repository::product::NewProduct;
    use atelier_core::{ErrorKind, Markup, PartnerProfile, PriceField, Product};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn register_reseller(db: &Database, username: &str, approve: bool) -> PartnerAccount {
        let account = db
            .partners()
            .register(NewPartner {
                profile: PartnerProfile::Reseller {
                    store_name: format!("{} store", username),
                },
                username: username.to_string(),
                email: format!("{}@store.example", username),
                phone: None,
                password: "storefront1".to_string(),
            })
            .await
            .unwrap();
        if approve {
            db.partners()
                .approve(PartnerType::Reseller, &account.id)
                .await
                .unwrap()
        } else {
            account
        }
    }

    async fn product(db: &Database, name: &str, cost: i64) -> Product {
        let product = db
            .products()
            .create(NewProduct {
                name: name.to_string(),
                cost_price: Money::from_cents(cost),
                ..Default::default()
            })
            .await
            .unwrap();
        db.products()
            .apply_price(&product.id, Markup::parse("percentage", "50").unwrap(), PriceField::Reseller)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_import_requires_approved_reseller() {
        let db = setup().await;
        let pending = register_reseller(&db, "pending", false).await;
        let bag = product(&db, "Tote", 10_000).await;

        let err = db
            .reseller_store()
            .import_product(&pending.id, &bag.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::PartnerNotApproved { .. })));

        let err = db
            .reseller_store()
            .import_product("missing", &bag.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_import_appends_and_reimport_keeps_position() {
        let db = setup().await;
        let reseller = register_reseller(&db, "maison", true).await;
        let a = product(&db, "Tote", 10_000).await;
        let b = product(&db, "Clutch", 20_000).await;
        let store = db.reseller_store();

        let first = store.import_product(&reseller.id, &a.id, None).await.unwrap();
        let second = store.import_product(&reseller.id, &b.id, None).await.unwrap();
        assert_eq!(first.display_order, 0);
        assert_eq!(second.display_order, 1);
        assert!(first.is_visible);

        store.set_visibility(&reseller.id, &a.id, false).await.unwrap();
        let again = store
            .import_product(&reseller.id, &a.id, Some(Money::from_cents(17_500)))
            .await
            .unwrap();
        assert_eq!(again.display_order, 0);
        assert!(!again.is_visible);
        assert_eq!(again.selling_price_cents, Some(17_500));
        assert_eq!(store.list(&reseller.id).await.unwrap().len(), 2);

        let err = store.import_product(&reseller.id, "missing", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_storefront_prices_and_visibility() {
        let db = setup().await;
        let reseller = register_reseller(&db, "maison", true).await;
        let a = product(&db, "Tote", 10_000).await;
        let b = product(&db, "Clutch", 20_000).await;
        let store = db.reseller_store();

        store.import_product(&reseller.id, &a.id, Some(Money::from_cents(12_000))).await.unwrap();
        store.import_product(&reseller.id, &b.id, None).await.unwrap();

        let front = store.storefront(&reseller.id).await.unwrap();
        assert_eq!(front.len(), 2);
        assert_eq!(front[0].price_cents, 12_000);
        assert_eq!(front[1].price_cents, 30_000);

        store.set_selling_price(&reseller.id, &a.id, None).await.unwrap();
        store.set_visibility(&reseller.id, &b.id, false).await.unwrap();

        let front = store.storefront(&reseller.id).await.unwrap();
        assert_eq!(front.len(), 1);
        assert_eq!(front[0].product_id, a.id);
        assert_eq!(front[0].price_cents, 15_000);
    }

    #[tokio::test]
    async fn test_storefront_closed_when_inactive() {
        let db = setup().await;
        let reseller = register_reseller(&db, "maison", true).await;
        db.partners()
            .set_active(PartnerType::Reseller, &reseller.id, false)
            .await
            .unwrap();

        let err = db.reseller_store().storefront(&reseller.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AccountInactive)));
    }

    #[tokio::test]
    async fn test_reorder_is_all_or_nothing() {
        let db = setup().await;
        let reseller = register_reseller(&db, "maison", true).await;
        let a = product(&db, "Tote", 10_000).await;
        let b = product(&db, "Clutch", 20_000).await;
        let c = product(&db, "Scarf", 5_000).await;
        let store = db.reseller_store();
        for p in [&a, &b, &c] {
            store.import_product(&reseller.id, &p.id, None).await.unwrap();
        }

        store
            .reorder(&reseller.id, &[c.id.clone(), a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        let order: Vec<String> = store
            .storefront(&reseller.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.product_id)
            .collect();
        assert_eq!(order, vec![c.id.clone(), a.id.clone(), b.id.clone()]);

        let err = store
            .reorder(&reseller.id, &[b.id.clone(), "missing".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        // b kept its old position
        let entries = store.list(&reseller.id).await.unwrap();
        assert_eq!(entries[2].product_id, b.id);

        let err = store
            .reorder(&reseller.id, &[a.id.clone(), a.id.clone()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
