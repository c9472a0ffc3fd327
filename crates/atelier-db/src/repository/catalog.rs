//! # Catalog Repository
//!
//! Brands, categories, sizes and vendors. Each gets a unique slug derived
//! from its name on insert.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::next_slug;
use atelier_core::validation::{validate_email, validate_name, validate_phone};
use atelier_core::{Brand, Category, Size, Vendor};

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Brands
    // -------------------------------------------------------------------------

    pub async fn create_brand(&self, name: &str) -> DbResult<Brand> {
        validate_name("brand name", name)?;

        let brand = Brand {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            slug: next_slug(&self.pool, "brands", name).await?,
            created_at: Utc::now(),
        };

        debug!(id = %brand.id, slug = %brand.slug, "Inserting brand");

        sqlx::query("INSERT INTO brands (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&brand.id)
            .bind(&brand.name)
            .bind(&brand.slug)
            .bind(brand.created_at)
            .execute(&self.pool)
            .await?;

        Ok(brand)
    }

    pub async fn list_brands(&self) -> DbResult<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>(
            "SELECT id, name, slug, created_at FROM brands ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(brands)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Inserts a category, optionally nested under `parent_id`.
    pub async fn create_category(&self, name: &str, parent_id: Option<&str>) -> DbResult<Category> {
        validate_name("category name", name)?;

        if let Some(parent_id) = parent_id {
            let exists: Option<String> =
                sqlx::query_scalar("SELECT id FROM categories WHERE id = ?1")
                    .bind(parent_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Category", parent_id));
            }
        }

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            slug: next_slug(&self.pool, "categories", name).await?,
            parent_id: parent_id.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(id = %category.id, slug = %category.slug, "Inserting category");

        sqlx::query(
            "INSERT INTO categories (id, name, slug, parent_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.parent_id)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, parent_id, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // -------------------------------------------------------------------------
    // Sizes
    // -------------------------------------------------------------------------

    pub async fn create_size(&self, label: &str, sort_order: i64) -> DbResult<Size> {
        validate_name("size label", label)?;

        let size = Size {
            id: Uuid::new_v4().to_string(),
            label: label.trim().to_string(),
            slug: next_slug(&self.pool, "sizes", label).await?,
            sort_order,
        };

        sqlx::query("INSERT INTO sizes (id, label, slug, sort_order) VALUES (?1, ?2, ?3, ?4)")
            .bind(&size.id)
            .bind(&size.label)
            .bind(&size.slug)
            .bind(size.sort_order)
            .execute(&self.pool)
            .await?;

        Ok(size)
    }

    /// Sizes in display order.
    pub async fn list_sizes(&self) -> DbResult<Vec<Size>> {
        let sizes = sqlx::query_as::<_, Size>(
            "SELECT id, label, slug, sort_order FROM sizes ORDER BY sort_order, label",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sizes)
    }

    // -------------------------------------------------------------------------
    // Vendors
    // -------------------------------------------------------------------------

    pub async fn create_vendor(
        &self,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<Vendor> {
        validate_name("vendor name", name)?;
        if let Some(email) = email {
            validate_email(email)?;
        }
        if let Some(phone) = phone {
            validate_phone(phone)?;
        }

        let vendor = Vendor {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            slug: next_slug(&self.pool, "vendors", name).await?,
            email: email.map(|e| e.trim().to_string()),
            phone: phone.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(id = %vendor.id, slug = %vendor.slug, "Inserting vendor");

        sqlx::query(
            r#"
            INSERT INTO vendors (id, name, slug, email, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&vendor.id)
        .bind(&vendor.name)
        .bind(&vendor.slug)
        .bind(&vendor.email)
        .bind(&vendor.phone)
        .bind(vendor.created_at)
        .execute(&self.pool)
        .await?;

        Ok(vendor)
    }

    pub async fn get_vendor(&self, id: &str) -> DbResult<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>(
            "SELECT id, name, slug, email, phone, created_at FROM vendors WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vendor)
    }

    pub async fn list_vendors(&self) -> DbResult<Vec<Vendor>> {
        let vendors = sqlx::query_as::<_, Vendor>(
            "SELECT id, name, slug, email, phone, created_at FROM vendors ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vendors)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use atelier_core::ErrorKind;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_brand_slugs_are_unique() {
        let db = setup().await;
        let catalog = db.catalog();

        let first = catalog.create_brand("Saint Laurent").await.unwrap();
        let second = catalog.create_brand("Saint  Laurent!").await.unwrap();
        let third = catalog.create_brand("saint-laurent").await.unwrap();

        assert_eq!(first.slug, "saint-laurent");
        assert_eq!(second.slug, "saint-laurent-2");
        assert_eq!(third.slug, "saint-laurent-3");
        assert_eq!(catalog.list_brands().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_category_parent_must_exist() {
        let db = setup().await;
        let catalog = db.catalog();

        let bags = catalog.create_category("Bags", None).await.unwrap();
        let totes = catalog.create_category("Totes", Some(&bags.id)).await.unwrap();
        assert_eq!(totes.parent_id.as_deref(), Some(bags.id.as_str()));

        let err = catalog.create_category("Orphan", Some("missing")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_sizes_listed_in_sort_order() {
        let db = setup().await;
        let catalog = db.catalog();

        catalog.create_size("EU 40", 2).await.unwrap();
        catalog.create_size("EU 38", 0).await.unwrap();
        catalog.create_size("EU 39", 1).await.unwrap();

        let labels: Vec<String> = catalog
            .list_sizes()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["EU 38", "EU 39", "EU 40"]);
    }

    #[tokio::test]
    async fn test_vendor_validation() {
        let db = setup().await;
        let catalog = db.catalog();

        let vendor = catalog
            .create_vendor("Maison Import", Some("orders@maison.example"), Some("+33142000000"))
            .await
            .unwrap();
        assert_eq!(catalog.get_vendor(&vendor.id).await.unwrap().unwrap().slug, "maison-import");

        let err = catalog.create_vendor("", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = catalog
            .create_vendor("Bad Mail", Some("not-an-email"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
