//! # Stock Reconciliation
//!
//! Recomputes on-hand quantity and cost basis for every product from the
//! purchase bills that are still in force.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Every known product starts at quantity 0 / out_of_stock            │
//! │                                                                         │
//! │  2. For each bill (in order) whose status ≠ cancelled:                 │
//! │       for each item (in order):                                        │
//! │         quantity[p] += item.quantity                                   │
//! │         cost[p]      = item.final_cost ?? item.cost   (last one wins)  │
//! │                                                                         │
//! │  3. status[p] = in_stock iff quantity[p] > 0                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is a full recompute, not an incremental update, so running it twice
//! over the same bills gives the same answer. Persisting the result
//! atomically is the storage layer's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{BillStatus, StockStatus};

// =============================================================================
// Inputs
// =============================================================================

/// One purchase line as the reconciler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: String,
    pub quantity: i64,
    pub cost_price: Money,
    pub final_cost_price: Option<Money>,
}

impl StockLine {
    #[inline]
    pub fn effective_cost(&self) -> Money {
        self.final_cost_price.unwrap_or(self.cost_price)
    }
}

/// A bill's status together with its ordered lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillStock {
    pub bill_id: String,
    pub status: BillStatus,
    pub lines: Vec<StockLine>,
}

// =============================================================================
// Outputs
// =============================================================================

/// The recomputed state of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: String,
    pub quantity: i64,
    /// `None` when no live item references the product; its recorded cost
    /// is then left as it was.
    pub cost_price: Option<Money>,
    pub status: StockStatus,
}

/// Result of a full reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// One level per product, ordered by product id.
    pub levels: Vec<StockLevel>,
    /// Non-cancelled bills that were scanned.
    pub contributing_bill_count: usize,
}

impl Reconciliation {
    /// Products that received at least one contribution.
    pub fn updated_product_count(&self) -> usize {
        self.levels
            .iter()
            .filter(|level| level.cost_price.is_some())
            .count()
    }

    pub fn level(&self, product_id: &str) -> Option<&StockLevel> {
        self.levels
            .binary_search_by(|level| level.product_id.as_str().cmp(product_id))
            .ok()
            .map(|idx| &self.levels[idx])
    }

    pub fn summary(&self) -> ReconcileSummary {
        ReconcileSummary {
            updated_product_count: self.updated_product_count(),
            contributing_bill_count: self.contributing_bill_count,
        }
    }
}

/// What `reconcileStock()` reports back to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub updated_product_count: usize,
    pub contributing_bill_count: usize,
}

// =============================================================================
// Reconciler
// =============================================================================

/// Recomputes stock for `known_products` from `bills`.
///
/// Products referenced by a live item but missing from `known_products` are
/// still reported, so nothing a bill contributes is silently dropped.
pub fn reconcile<'a, I>(known_products: I, bills: &[BillStock]) -> Reconciliation
where
    I: IntoIterator<Item = &'a str>,
{
    let mut levels: BTreeMap<String, StockLevel> = known_products
        .into_iter()
        .map(|id| {
            (
                id.to_string(),
                StockLevel {
                    product_id: id.to_string(),
                    quantity: 0,
                    cost_price: None,
                    status: StockStatus::OutOfStock,
                },
            )
        })
        .collect();

    let mut contributing_bill_count = 0;

    for bill in bills.iter().filter(|b| b.status != BillStatus::Cancelled) {
        contributing_bill_count += 1;

        for line in &bill.lines {
            let level = levels
                .entry(line.product_id.clone())
                .or_insert_with(|| StockLevel {
                    product_id: line.product_id.clone(),
                    quantity: 0,
                    cost_price: None,
                    status: StockStatus::OutOfStock,
                });

            level.quantity += line.quantity;
            level.cost_price = Some(line.effective_cost());
        }
    }

    let levels = levels
        .into_values()
        .map(|mut level| {
            level.status = StockStatus::from_quantity(level.quantity);
            level
        })
        .collect();

    Reconciliation {
        levels,
        contributing_bill_count,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(product: &str, quantity: i64, cost: i64, final_cost: Option<i64>) -> StockLine {
        StockLine {
            product_id: product.to_string(),
            quantity,
            cost_price: Money::from_cents(cost),
            final_cost_price: final_cost.map(Money::from_cents),
        }
    }

    fn bill(id: &str, status: BillStatus, lines: Vec<StockLine>) -> BillStock {
        BillStock {
            bill_id: id.to_string(),
            status,
            lines,
        }
    }

    #[test]
    fn test_quantities_sum_across_bills() {
        let bills = vec![
            bill("b1", BillStatus::Pending, vec![line("p1", 2, 100, None), line("p2", 1, 50, None)]),
            bill("b2", BillStatus::Paid, vec![line("p1", 3, 120, None)]),
        ];

        let result = reconcile(["p1", "p2", "p3"], &bills);

        let p1 = result.level("p1").unwrap();
        assert_eq!(p1.quantity, 5);
        assert_eq!(p1.status, StockStatus::InStock);

        let p3 = result.level("p3").unwrap();
        assert_eq!(p3.quantity, 0);
        assert_eq!(p3.status, StockStatus::OutOfStock);
        assert_eq!(p3.cost_price, None);

        assert_eq!(result.contributing_bill_count, 2);
        assert_eq!(result.updated_product_count(), 2);
    }

    #[test]
    fn test_cost_is_last_write_wins_not_average() {
        let bills = vec![
            bill("b1", BillStatus::Pending, vec![line("p1", 10, 100, Some(110))]),
            bill("b2", BillStatus::Pending, vec![line("p1", 1, 500, None), line("p1", 1, 300, None)]),
        ];

        let result = reconcile(["p1"], &bills);
        assert_eq!(result.level("p1").unwrap().cost_price, Some(Money::from_cents(300)));
    }

    #[test]
    fn test_final_cost_preferred_over_base_cost() {
        let bills = vec![bill("b1", BillStatus::Pending, vec![line("p1", 1, 100, Some(125))])];
        let result = reconcile(["p1"], &bills);
        assert_eq!(result.level("p1").unwrap().cost_price, Some(Money::from_cents(125)));
    }

    #[test]
    fn test_cancelled_bill_excluded_entirely() {
        let mut bills = vec![
            bill("b1", BillStatus::Pending, vec![line("p1", 4, 100, None)]),
            bill("b2", BillStatus::Pending, vec![line("p1", 6, 999, None)]),
        ];
        assert_eq!(reconcile(["p1"], &bills).level("p1").unwrap().quantity, 10);

        bills[1].status = BillStatus::Cancelled;
        let result = reconcile(["p1"], &bills);
        let p1 = result.level("p1").unwrap();
        assert_eq!(p1.quantity, 4);
        assert_eq!(p1.cost_price, Some(Money::from_cents(100)));
        assert_eq!(result.contributing_bill_count, 1);
    }

    #[test]
    fn test_unknown_product_still_reported() {
        let bills = vec![bill("b1", BillStatus::Pending, vec![line("ghost", 1, 100, None)])];
        let result = reconcile(std::iter::empty(), &bills);
        assert_eq!(result.level("ghost").unwrap().quantity, 1);
    }

    #[test]
    fn test_summary_shape() {
        let bills = vec![bill("b1", BillStatus::Pending, vec![line("p1", 1, 100, None)])];
        let summary = reconcile(["p1", "p2"], &bills).summary();
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            serde_json::json!({ "updatedProductCount": 1, "contributingBillCount": 1 })
        );
    }

    fn arb_bills() -> impl Strategy<Value = Vec<BillStock>> {
        let status = prop_oneof![
            Just(BillStatus::Pending),
            Just(BillStatus::Paid),
            Just(BillStatus::Cancelled)
        ];
        let line = (0usize..5, 1i64..50, 0i64..100_000, proptest::option::of(0i64..100_000))
            .prop_map(|(p, q, c, f)| line(&format!("p{}", p), q, c, f));
        proptest::collection::vec((status, proptest::collection::vec(line, 0..6)), 0..8).prop_map(
            |bills| {
                bills
                    .into_iter()
                    .enumerate()
                    .map(|(i, (status, lines))| bill(&format!("b{}", i), status, lines))
                    .collect()
            },
        )
    }

    const PRODUCTS: [&str; 5] = ["p0", "p1", "p2", "p3", "p4"];

    proptest! {
        #[test]
        fn prop_quantity_is_sum_of_live_items(bills in arb_bills()) {
            let result = reconcile(PRODUCTS, &bills);

            for product in PRODUCTS {
                let expected: i64 = bills
                    .iter()
                    .filter(|b| b.status != BillStatus::Cancelled)
                    .flat_map(|b| &b.lines)
                    .filter(|l| l.product_id == product)
                    .map(|l| l.quantity)
                    .sum();

                let level = result.level(product).unwrap();
                prop_assert_eq!(level.quantity, expected);
                prop_assert_eq!(level.status, StockStatus::from_quantity(expected));
                prop_assert!(level.quantity >= 0);
            }
        }

        #[test]
        fn prop_reconcile_is_idempotent(bills in arb_bills()) {
            prop_assert_eq!(reconcile(PRODUCTS, &bills), reconcile(PRODUCTS, &bills));
        }
    }
}
