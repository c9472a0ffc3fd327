//! # Domain Types
//!
//! Core domain types used throughout Atelier.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog            Purchasing                 Channel partners         │
//! │  ───────            ──────────                 ────────────────         │
//! │  Brand              PurchaseBill ──┐           PartnerAccount           │
//! │  Category             │ status     │ owns        partner_type           │
//! │  Size                 │ balance    ├──► PurchaseItem                    │
//! │  Vendor               │            └──► PurchasePayment                 │
//! │  Product ◄────────────┘ (stock + cost derived from items)              │
//! │     ▲                                                                   │
//! │     └──── ResellerProduct (reseller storefront join) ◄── Reseller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All money columns are integer cents (`*_cents`) with [`Money`] accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::ledger::BillCharges;
use crate::money::Money;
use crate::pricing::PriceField;

// =============================================================================
// Stock Status
// =============================================================================

/// Whether a product has units on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    /// Status is a pure function of quantity: anything above zero is in stock.
    #[inline]
    pub const fn from_quantity(quantity: i64) -> Self {
        if quantity > 0 {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Optional parent for nested categories (Bags > Totes).
    pub parent_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A size label (EU 38, S, One Size) with its display position.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Size {
    pub id: String,
    pub label: String,
    pub slug: String,
    pub sort_order: i64,
}

/// A supplier that purchase bills are raised against.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// `stock_quantity`, `status` and `cost_price_cents` are owned by the stock
/// reconciler; the three sale prices are owned by the price calculator.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    /// URL slug, unique across products.
    pub slug: String,

    pub brand_id: Option<String>,
    pub category_id: Option<String>,
    pub size_id: Option<String>,

    /// Cost basis in cents (last purchase cost after expenses).
    pub cost_price_cents: i64,

    /// Price charged to wholesalers.
    pub wholesale_price_cents: i64,

    /// Price charged to resellers (and their default storefront price).
    pub reseller_price_cents: i64,

    /// Price charged to retail customers.
    pub retail_price_cents: i64,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,

    pub status: StockStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,
}

impl Product {
    /// Returns the cost basis as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Returns the sale price stored in the given field.
    pub fn price(&self, field: PriceField) -> Money {
        Money::from_cents(match field {
            PriceField::Wholesale => self.wholesale_price_cents,
            PriceField::Reseller => self.reseller_price_cents,
            PriceField::Retail => self.retail_price_cents,
        })
    }

    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.status == StockStatus::InStock
    }
}

// =============================================================================
// Purchase Bill
// =============================================================================

/// Lifecycle of a purchase bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Balance outstanding.
    Pending,
    /// Balance is zero.
    Paid,
    /// Excluded from stock and closed to payments.
    Cancelled,
}

impl Default for BillStatus {
    fn default() -> Self {
        BillStatus::Pending
    }
}

/// A vendor invoice for purchased inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseBill {
    pub id: String,
    pub vendor_id: String,

    /// Vendor's invoice number.
    pub bill_number: String,

    /// Σ quantity × cost price over the items, before expenses.
    pub total_amount_cents: i64,

    /// Σ payments recorded against the bill.
    pub paid_amount_cents: i64,

    /// total + expenses − paid. Never negative.
    pub balance_amount_cents: i64,

    pub shipping_charges_cents: i64,
    pub miscellaneous_cents: i64,

    /// Cost of original packaging bought with the goods.
    pub original_box_cents: i64,

    pub status: BillStatus,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub version: i64,
}

impl PurchaseBill {
    /// The amounts the ledger works from.
    pub fn charges(&self) -> BillCharges {
        BillCharges {
            total_amount: Money::from_cents(self.total_amount_cents),
            shipping_charges: Money::from_cents(self.shipping_charges_cents),
            miscellaneous: Money::from_cents(self.miscellaneous_cents),
            original_box: Money::from_cents(self.original_box_cents),
        }
    }

    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_amount_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_amount_cents)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.status == BillStatus::Cancelled
    }
}

/// A line on a purchase bill. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItem {
    pub id: String,
    pub bill_id: String,
    pub product_id: String,

    /// Position within the bill (0-based).
    pub position: i64,

    pub quantity: i64,

    /// Unit cost as invoiced.
    pub cost_price_cents: i64,

    /// Unit cost after the bill's shared expenses were distributed.
    pub final_cost_price_cents: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PurchaseItem {
    /// The cost this line contributes to the product's cost basis.
    #[inline]
    pub fn effective_cost(&self) -> Money {
        Money::from_cents(self.final_cost_price_cents.unwrap_or(self.cost_price_cents))
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    BankTransfer,
    Cheque,
    Upi,
    Card,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 5] = [
        PaymentMode::Cash,
        PaymentMode::BankTransfer,
        PaymentMode::Cheque,
        PaymentMode::Upi,
        PaymentMode::Card,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::BankTransfer => "bank_transfer",
            PaymentMode::Cheque => "cheque",
            PaymentMode::Upi => "upi",
            PaymentMode::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; `bank-transfer` and `Bank Transfer` are accepted.
impl FromStr for PaymentMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        PaymentMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownPaymentMode(s.trim().to_string()))
    }
}

/// A payment against a purchase bill. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchasePayment {
    pub id: String,
    pub bill_id: String,
    pub amount_cents: i64,
    pub payment_mode: PaymentMode,
    /// Free-form reference (cheque number, UTR, card slip).
    pub details: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PurchasePayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Channel Partners
// =============================================================================

/// The three partner tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PartnerType {
    Wholesaler,
    Reseller,
    Retailer,
}

impl PartnerType {
    pub const ALL: [PartnerType; 3] = [
        PartnerType::Wholesaler,
        PartnerType::Reseller,
        PartnerType::Retailer,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PartnerType::Wholesaler => "wholesaler",
            PartnerType::Reseller => "reseller",
            PartnerType::Retailer => "retailer",
        }
    }
}

impl fmt::Display for PartnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartnerType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PartnerType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                CoreError::Validation(crate::error::ValidationError::NotAllowed {
                    field: "partner type".to_string(),
                    allowed: PartnerType::ALL
                        .iter()
                        .map(|kind| kind.as_str().to_string())
                        .collect(),
                })
            })
    }
}

/// Approval lifecycle of a self-registered partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for RegistrationStatus {
    fn default() -> Self {
        RegistrationStatus::Pending
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        })
    }
}

/// Whether an account may be used at all. Kept in sync with registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

/// The columns every partner tier shares.
///
/// `display_name` is the tier's own name column (company, store or shop).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PartnerAccount {
    pub id: String,
    pub partner_type: PartnerType,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,

    pub display_name: String,
    pub status: AccountStatus,
    pub registration_status: RegistrationStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The attributes that distinguish one partner tier from another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartnerProfile {
    Wholesaler {
        company_name: String,
        gst_number: Option<String>,
    },
    Reseller {
        store_name: String,
    },
    Retailer {
        shop_name: String,
        city: Option<String>,
    },
}

impl PartnerProfile {
    pub fn partner_type(&self) -> PartnerType {
        match self {
            PartnerProfile::Wholesaler { .. } => PartnerType::Wholesaler,
            PartnerProfile::Reseller { .. } => PartnerType::Reseller,
            PartnerProfile::Retailer { .. } => PartnerType::Retailer,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            PartnerProfile::Wholesaler { company_name, .. } => company_name,
            PartnerProfile::Reseller { store_name } => store_name,
            PartnerProfile::Retailer { shop_name, .. } => shop_name,
        }
    }
}

/// A partner whose credentials and lifecycle checked out.
///
/// This is what the session issuer receives; the core trusts it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PartnerIdentity {
    pub partner_type: PartnerType,
    pub id: String,
    pub username: String,
    pub display_name: String,
}

// =============================================================================
// Reseller Storefront
// =============================================================================

/// A product a reseller has imported into their storefront.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ResellerProduct {
    pub id: String,
    pub reseller_id: String,
    pub product_id: String,

    /// Overrides the product's reseller price when set.
    pub selling_price_cents: Option<i64>,

    pub is_visible: bool,
    pub display_order: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One row of a reseller's public storefront.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StorefrontEntry {
    pub product_id: String,
    pub name: String,
    pub slug: String,
    /// Override if set, otherwise the product's reseller price.
    pub price_cents: i64,
    pub status: StockStatus,
    pub display_order: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
