//! # Purchase Repository
//!
//! Purchase bills, their items and the payment ledger.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create_bill() → items with final cost, status pending          │
//! │                                                                         │
//! │  2. PAY (repeatable)                                                   │
//! │     └── record_payment() → payment row + paid/balance/status           │
//! │         (pending → paid once the balance reaches zero)                 │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                  │
//! │     └── cancel_bill() → cancelled; drops out of stock on the next      │
//! │         reconcile and refuses further payments                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Serialization
//! ```text
//! payment A ──► gate ──► BEGIN ─ read Σpayments ─ insert ─ update ─ COMMIT
//! payment B ──► gate (waits) ····································► BEGIN ─ read Σpayments (sees A) ...
//! ```
//! The bill update also checks `version`, so a writer from another process
//! surfaces as a conflict instead of an over-payment.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::WriteGate;
use atelier_core::expenses::{allocate_final_costs, CostLine};
use atelier_core::ledger::{self, BillCharges};
use atelier_core::validation::{
    validate_bill_number, validate_non_negative_cents, validate_payment_amount, validate_quantity,
};
use atelier_core::{
    BillStatus, CoreError, Money, PaymentMode, PurchaseBill, PurchaseItem, PurchasePayment,
    ValidationError,
};

const BILL_COLUMNS: &str = r#"
    id, vendor_id, bill_number,
    total_amount_cents, paid_amount_cents, balance_amount_cents,
    shipping_charges_cents, miscellaneous_cents, original_box_cents,
    status, notes, created_at, updated_at, version
"#;

// =============================================================================
// Inputs / Outputs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchaseItem {
    pub product_id: String,
    pub quantity: i64,
    pub cost_price: Money,
}

/// Input for [`PurchaseRepository::create_bill`]. Absent charges are zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPurchaseBill {
    pub vendor_id: String,
    pub bill_number: String,
    pub items: Vec<NewPurchaseItem>,
    pub shipping_charges: Money,
    pub miscellaneous: Money,
    pub original_box: Money,
    pub notes: Option<String>,
}

/// A bill with everything it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillDetail {
    pub bill: PurchaseBill,
    pub items: Vec<PurchaseItem>,
    pub payments: Vec<PurchasePayment>,
}

/// What `record_payment` returns: the new payment and the bill after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment: PurchasePayment,
    pub bill: PurchaseBill,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for purchase bill database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
    gate: WriteGate,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool, gate: WriteGate) -> Self {
        PurchaseRepository { pool, gate }
    }

    /// Creates a bill with its items.
    ///
    /// ## What This Does
    /// 1. Validates the bill number, charges and every line
    /// 2. Checks the vendor and every product exist
    /// 3. total = Σ quantity × cost; each item's final cost absorbs its share
    ///    of shipping + miscellaneous + original box
    /// 4. Inserts bill and items in one transaction
    ///
    /// Stock is not touched; run `reconcile_stock` afterwards.
    pub async fn create_bill(&self, input: NewPurchaseBill) -> DbResult<BillDetail> {
        validate_bill_number(&input.bill_number)?;
        validate_non_negative_cents("shipping charges", input.shipping_charges.cents())?;
        validate_non_negative_cents("miscellaneous", input.miscellaneous.cents())?;
        validate_non_negative_cents("original box", input.original_box.cents())?;

        if input.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        for item in &input.items {
            validate_quantity(item.quantity)?;
            validate_non_negative_cents("cost price", item.cost_price.cents())?;
        }

        let lines: Vec<CostLine> = input
            .items
            .iter()
            .map(|item| CostLine {
                quantity: item.quantity,
                cost_price: item.cost_price,
            })
            .collect();

        let charges = BillCharges {
            total_amount: lines.iter().map(CostLine::value).sum(),
            shipping_charges: input.shipping_charges,
            miscellaneous: input.miscellaneous,
            original_box: input.original_box,
        };
        let final_costs = allocate_final_costs(&lines, charges.expenses());
        let balance = charges.total_with_expenses();

        let now = Utc::now();
        let bill = PurchaseBill {
            id: Uuid::new_v4().to_string(),
            vendor_id: input.vendor_id.clone(),
            bill_number: input.bill_number.trim().to_string(),
            total_amount_cents: charges.total_amount.cents(),
            paid_amount_cents: 0,
            balance_amount_cents: balance.cents(),
            shipping_charges_cents: charges.shipping_charges.cents(),
            miscellaneous_cents: charges.miscellaneous.cents(),
            original_box_cents: charges.original_box.cents(),
            status: ledger::status_for_balance(balance),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let items: Vec<PurchaseItem> = input
            .items
            .iter()
            .zip(final_costs)
            .enumerate()
            .map(|(position, (item, final_cost))| PurchaseItem {
                id: Uuid::new_v4().to_string(),
                bill_id: bill.id.clone(),
                product_id: item.product_id.clone(),
                position: position as i64,
                quantity: item.quantity,
                cost_price_cents: item.cost_price.cents(),
                final_cost_price_cents: Some(final_cost.cents()),
                created_at: now,
            })
            .collect();

        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let vendor: Option<String> = sqlx::query_scalar("SELECT id FROM vendors WHERE id = ?1")
            .bind(&bill.vendor_id)
            .fetch_optional(&mut *tx)
            .await?;
        if vendor.is_none() {
            return Err(DbError::not_found("Vendor", &bill.vendor_id));
        }

        for item in &items {
            let product: Option<String> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?1")
                .bind(&item.product_id)
                .fetch_optional(&mut *tx)
                .await?;
            if product.is_none() {
                return Err(CoreError::ProductNotFound(item.product_id.clone()).into());
            }
        }

        debug!(id = %bill.id, bill_number = %bill.bill_number, items = items.len(), "Inserting purchase bill");

        sqlx::query(
            r#"
            INSERT INTO purchase_bills (
                id, vendor_id, bill_number,
                total_amount_cents, paid_amount_cents, balance_amount_cents,
                shipping_charges_cents, miscellaneous_cents, original_box_cents,
                status, notes, created_at, updated_at, version
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.vendor_id)
        .bind(&bill.bill_number)
        .bind(bill.total_amount_cents)
        .bind(bill.paid_amount_cents)
        .bind(bill.balance_amount_cents)
        .bind(bill.shipping_charges_cents)
        .bind(bill.miscellaneous_cents)
        .bind(bill.original_box_cents)
        .bind(bill.status)
        .bind(&bill.notes)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .bind(bill.version)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (
                    id, bill_id, product_id, position,
                    quantity, cost_price_cents, final_cost_price_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.bill_id)
            .bind(&item.product_id)
            .bind(item.position)
            .bind(item.quantity)
            .bind(item.cost_price_cents)
            .bind(item.final_cost_price_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %bill.id,
            total = %charges.total_amount,
            expenses = %charges.expenses(),
            "Created purchase bill"
        );

        Ok(BillDetail {
            bill,
            items,
            payments: Vec::new(),
        })
    }

    /// Gets a bill by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseBill>> {
        let sql = format!("SELECT {} FROM purchase_bills WHERE id = ?1", BILL_COLUMNS);
        let bill = sqlx::query_as::<_, PurchaseBill>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(bill)
    }

    /// Gets a bill with its items and payments.
    pub async fn get_bill(&self, id: &str) -> DbResult<BillDetail> {
        let bill = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::BillNotFound(id.to_string()))?;

        let items = self.get_items(id).await?;
        let payments = self.get_payments(id).await?;

        Ok(BillDetail {
            bill,
            items,
            payments,
        })
    }

    /// Lists bills, newest first, optionally by status.
    pub async fn list_bills(&self, status: Option<BillStatus>) -> DbResult<Vec<PurchaseBill>> {
        let bills = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM purchase_bills WHERE status = ?1 ORDER BY created_at DESC, rowid DESC",
                    BILL_COLUMNS
                );
                sqlx::query_as::<_, PurchaseBill>(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM purchase_bills ORDER BY created_at DESC, rowid DESC",
                    BILL_COLUMNS
                );
                sqlx::query_as::<_, PurchaseBill>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(bills)
    }

    /// Items of a bill in position order.
    pub async fn get_items(&self, bill_id: &str) -> DbResult<Vec<PurchaseItem>> {
        let items = sqlx::query_as::<_, PurchaseItem>(
            r#"
            SELECT
                id, bill_id, product_id, position,
                quantity, cost_price_cents, final_cost_price_cents, created_at
            FROM purchase_items
            WHERE bill_id = ?1
            ORDER BY position
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn get_payments(&self, bill_id: &str) -> DbResult<Vec<PurchasePayment>> {
        let payments = sqlx::query_as::<_, PurchasePayment>(
            r#"
            SELECT id, bill_id, amount_cents, payment_mode, details, created_at
            FROM purchase_payments
            WHERE bill_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Payments recorded against a bill, oldest first.
    pub async fn list_payments(&self, bill_id: &str) -> DbResult<Vec<PurchasePayment>> {
        if self.get_by_id(bill_id).await?.is_none() {
            return Err(CoreError::BillNotFound(bill_id.to_string()).into());
        }

        self.get_payments(bill_id).await
    }

    /// Cancels a pending or paid bill.
    ///
    /// ## Errors
    /// - `BillNotFound` if the bill doesn't exist
    /// - `BillAlreadyCancelled` if it was cancelled before
    pub async fn cancel_bill(&self, id: &str) -> DbResult<PurchaseBill> {
        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM purchase_bills WHERE id = ?1", BILL_COLUMNS);
        let bill = sqlx::query_as::<_, PurchaseBill>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::BillNotFound(id.to_string()))?;

        if bill.is_cancelled() {
            return Err(CoreError::BillAlreadyCancelled(id.to_string()).into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE purchase_bills SET
                status = 'cancelled',
                updated_at = ?2,
                version = version + 1
            WHERE id = ?1 AND version = ?3
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(bill.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Purchase bill", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, "Cancelled purchase bill");

        Ok(PurchaseBill {
            status: BillStatus::Cancelled,
            updated_at: now,
            version: bill.version + 1,
            ..bill
        })
    }

    /// Records a payment against a bill.
    ///
    /// ## What This Does
    /// 1. Validates the amount (> 0)
    /// 2. Loads the bill; cancelled bills refuse payments
    /// 3. Sums existing payments and checks the amount against the balance
    /// 4. Inserts the payment and rewrites paid/balance/status, guarded by
    ///    the bill's version
    ///
    /// Steps 2 to 4 run under the write gate in one transaction.
    ///
    /// ## Errors
    /// - `BillNotFound`
    /// - `PaymentExceedsBalance` with the exact balance in the message
    /// - `BillCancelled`
    /// - `Conflict` if the bill changed under us
    pub async fn record_payment(
        &self,
        bill_id: &str,
        amount: Money,
        mode: PaymentMode,
        details: Option<String>,
    ) -> DbResult<PaymentRecord> {
        validate_payment_amount(amount.cents())?;

        let _gate = self.gate.acquire().await;
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM purchase_bills WHERE id = ?1", BILL_COLUMNS);
        let bill = sqlx::query_as::<_, PurchaseBill>(&sql)
            .bind(bill_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()))?;

        if bill.is_cancelled() {
            return Err(CoreError::BillCancelled(bill_id.to_string()).into());
        }

        let current_paid: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM purchase_payments WHERE bill_id = ?1",
        )
        .bind(bill_id)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = ledger::apply_payment(&bill.charges(), Money::from_cents(current_paid), amount)?;

        let now = Utc::now();
        let payment = PurchasePayment {
            id: Uuid::new_v4().to_string(),
            bill_id: bill_id.to_string(),
            amount_cents: amount.cents(),
            payment_mode: mode,
            details: details.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            created_at: now,
        };

        debug!(bill_id = %bill_id, amount = %amount, mode = %mode, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO purchase_payments (id, bill_id, amount_cents, payment_mode, details, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.bill_id)
        .bind(payment.amount_cents)
        .bind(payment.payment_mode)
        .bind(&payment.details)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE purchase_bills SET
                paid_amount_cents = ?2,
                balance_amount_cents = ?3,
                status = ?4,
                updated_at = ?5,
                version = version + 1
            WHERE id = ?1 AND version = ?6
            "#,
        )
        .bind(bill_id)
        .bind(outcome.paid.cents())
        .bind(outcome.balance.cents())
        .bind(outcome.status)
        .bind(now)
        .bind(bill.version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Purchase bill", bill_id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            bill_id = %bill_id,
            amount = %amount,
            paid = %outcome.paid,
            balance = %outcome.balance,
            status = ?outcome.status,
            "Recorded payment"
        );

        let bill = PurchaseBill {
            paid_amount_cents: outcome.paid.cents(),
            balance_amount_cents: outcome.balance.cents(),
            status: outcome.status,
            updated_at: now,
            version: bill.version + 1,
            ..bill
        };

        Ok(PaymentRecord { payment, bill })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
