//! # Expense Distribution
//!
//! Spreads a bill's shared expenses (shipping, miscellaneous, original box)
//! over its lines to produce each line's landed unit cost.
//!
//! ```text
//! line_value      = quantity × cost
//! line_share      = expenses × line_value / total_value
//! final_unit_cost = cost + line_share / quantity        (half-even, to the cent)
//!
//! total_value = 0  →  shares are split by quantity instead
//! ```

use crate::money::{div_round_half_even, Money};

/// A bill line before expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostLine {
    pub quantity: i64,
    pub cost_price: Money,
}

impl CostLine {
    pub fn value(&self) -> Money {
        self.cost_price.multiply_quantity(self.quantity)
    }
}

/// Returns the final unit cost of each line, in input order.
///
/// Lines with a non-positive quantity keep their cost unchanged.
pub fn allocate_final_costs(lines: &[CostLine], expenses: Money) -> Vec<Money> {
    let total_value: i128 = lines.iter().map(|l| l.value().cents() as i128).sum();
    let total_quantity: i128 = lines
        .iter()
        .filter(|l| l.quantity > 0)
        .map(|l| l.quantity as i128)
        .sum();
    let expenses = expenses.cents() as i128;

    lines
        .iter()
        .map(|line| {
            if line.quantity <= 0 || expenses == 0 {
                return line.cost_price;
            }

            let per_unit = if total_value > 0 {
                // expenses × (qty × cost) / (total × qty) = expenses × cost / total
                div_round_half_even(expenses * line.cost_price.cents() as i128, total_value)
            } else if total_quantity > 0 {
                div_round_half_even(expenses, total_quantity)
            } else {
                0
            };

            line.cost_price + Money::from_cents(per_unit as i64)
        })
        .collect()
}
