//! # Command Handlers
//!
//! One async function per `atelier-admin` subcommand. Each parses its raw
//! arguments into domain types, calls one repository operation and returns
//! the result as JSON.
//!
//! Arguments arrive as strings so that a bad markup type or payment mode is
//! reported through [`ApiError`] like any other rejection.

use atelier_core::{Markup, Money, PartnerType, PaymentMode, PriceField};
use atelier_db::Database;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ApiError;

/// Result type for command handlers.
pub type CommandResult = Result<Value, ApiError>;

fn to_json<T: Serialize>(value: &T) -> CommandResult {
    serde_json::to_value(value).map_err(|e| ApiError::storage(format!("Serialization failed: {}", e)))
}

fn parse_partner_type(raw: &str) -> Result<PartnerType, ApiError> {
    Ok(raw.parse::<PartnerType>()?)
}

// =============================================================================
// Maintenance
// =============================================================================

/// Applies pending migrations and reports how many are in place.
pub async fn migrate(db: &Database) -> CommandResult {
    db.run_migrations().await?;
    let status = atelier_db::migrations::status(db.pool()).await?;
    info!(total = status.total, applied = status.applied, "Migrations up to date");
    to_json(&status)
}

// =============================================================================
// Stock & Pricing
// =============================================================================

pub async fn reconcile_stock(db: &Database) -> CommandResult {
    let summary = db.products().reconcile_stock().await?;
    to_json(&summary)
}

pub async fn apply_price(
    db: &Database,
    product_id: &str,
    markup_type: &str,
    markup_value: &str,
    field: &str,
) -> CommandResult {
    let markup = Markup::parse(markup_type, markup_value)?;
    let field: PriceField = field.parse()?;
    debug!(product_id = %product_id, markup = %markup, field = %field, "apply-price");

    let product = db.products().apply_price(product_id, markup, field).await?;
    to_json(&product)
}

pub async fn bulk_price(db: &Database, markup_type: &str, markup_value: &str, field: &str) -> CommandResult {
    let markup = Markup::parse(markup_type, markup_value)?;
    let field: PriceField = field.parse()?;
    debug!(markup = %markup, field = %field, "bulk-price");

    let summary = db.products().bulk_apply_price(markup, field).await?;
    to_json(&summary)
}

// =============================================================================
// Purchase Bills
// =============================================================================

pub async fn record_payment(
    db: &Database,
    bill_id: &str,
    amount: &str,
    mode: &str,
    details: Option<String>,
    currency_symbol: &str,
) -> CommandResult {
    let amount = Money::parse(amount).map_err(atelier_core::CoreError::from)?;
    let mode: PaymentMode = mode.parse()?;

    let record = db.purchases().record_payment(bill_id, amount, mode, details).await?;
    info!(
        bill_id = %bill_id,
        amount = %amount.format_with(currency_symbol),
        balance = %record.bill.balance().format_with(currency_symbol),
        "Payment recorded"
    );
    to_json(&record)
}

/// Cancels a bill; with `reconcile`, stock is recomputed right after.
pub async fn cancel_bill(db: &Database, bill_id: &str, reconcile: bool) -> CommandResult {
    let bill = db.purchases().cancel_bill(bill_id).await?;

    if !reconcile {
        return to_json(&bill);
    }

    let summary = db.products().reconcile_stock().await?;
    Ok(json!({
        "bill": to_json(&bill)?,
        "reconciliation": to_json(&summary)?,
    }))
}

// =============================================================================
// Partners
// =============================================================================

pub async fn approve(db: &Database, partner_type: &str, id: &str) -> CommandResult {
    let partner_type = parse_partner_type(partner_type)?;
    let account = db.partners().approve(partner_type, id).await?;
    to_json(&account)
}

pub async fn reject(db: &Database, partner_type: &str, id: &str) -> CommandResult {
    let partner_type = parse_partner_type(partner_type)?;
    let account = db.partners().reject(partner_type, id).await?;
    to_json(&account)
}

/// Registrations awaiting a decision, optionally for one tier.
pub async fn pending(db: &Database, partner_type: Option<&str>) -> CommandResult {
    let partner_type = partner_type.map(parse_partner_type).transpose()?;
    let accounts = db.partners().list_pending(partner_type).await?;
    to_json(&accounts)
}

pub async fn storefront(db: &Database, reseller_id: &str) -> CommandResult {
    let entries = db.reseller_store().storefront(reseller_id).await?;
    to_json(&entries)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use atelier_db::{DbConfig, NewProduct, NewPurchaseBill, NewPurchaseItem};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_reconcile_output_shape() {
        let db = setup().await;
        let out = reconcile_stock(&db).await.unwrap();
        assert_eq!(out["updatedProductCount"], 0);
        assert_eq!(out["contributingBillCount"], 0);
    }

    #[tokio::test]
    async fn test_bad_arguments_become_invalid_input() {
        let db = setup().await;

        let err = bulk_price(&db, "tiered", "10", "retail").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err = bulk_price(&db, "percentage", "10", "msrp").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err = record_payment(&db, "bill", "10.00", "barter", None, "₹").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let err = approve(&db, "distributor", "x").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_overpayment_reports_balance() {
        let db = setup().await;
        let vendor = db.catalog().create_vendor("Fratelli", None, None).await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                name: "Derby".to_string(),
                cost_price: Money::from_cents(100_000),
                ..Default::default()
            })
            .await
            .unwrap();
        let detail = db
            .purchases()
            .create_bill(NewPurchaseBill {
                vendor_id: vendor.id,
                bill_number: "F-1".to_string(),
                items: vec![NewPurchaseItem {
                    product_id: product.id,
                    quantity: 1,
                    cost_price: Money::from_cents(100_000),
                }],
                ..Default::default()
            })
            .await
            .unwrap();

        record_payment(&db, &detail.bill.id, "850", "upi", None, "₹").await.unwrap();
        let err = record_payment(&db, &detail.bill.id, "200", "cash", None, "₹")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.contains("150.00"));

        let out = cancel_bill(&db, &detail.bill.id, true).await.unwrap();
        assert_eq!(out["bill"]["status"], "cancelled");
        assert_eq!(out["reconciliation"]["contributingBillCount"], 0);
    }

    #[tokio::test]
    async fn test_unknown_partner_is_not_found() {
        let db = setup().await;
        let err = approve(&db, "reseller", "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let out = pending(&db, None).await.unwrap();
        assert_eq!(out, json!([]));
    }
}
