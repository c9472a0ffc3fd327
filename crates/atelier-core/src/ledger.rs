//! # Payment Ledger
//!
//! Balance accounting for purchase bills.
//!
//! ## Balance Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  expenses          = shipping + miscellaneous + original_box           │
//! │  total_with_exp    = total_amount + expenses                           │
//! │  current_balance   = total_with_exp − Σ existing payments              │
//! │                                                                         │
//! │  record(amount):                                                        │
//! │    amount ≤ 0                → InvalidInput                            │
//! │    amount > current_balance  → InvalidInput (Maximum allowed: balance) │
//! │    otherwise                                                            │
//! │      paid    = current_paid + amount                                   │
//! │      balance = total_with_exp − paid                                   │
//! │      status  = paid if balance ≤ 0 else pending                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `current_paid` is always the sum of the payment rows, never the cached
//! `paid_amount` column, so a drifted cache cannot let an over-payment through.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::BillStatus;

/// The charge side of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillCharges {
    pub total_amount: Money,
    pub shipping_charges: Money,
    pub miscellaneous: Money,
    pub original_box: Money,
}

impl BillCharges {
    /// Shared expenses on top of the goods total.
    pub fn expenses(&self) -> Money {
        self.shipping_charges + self.miscellaneous + self.original_box
    }

    pub fn total_with_expenses(&self) -> Money {
        self.total_amount + self.expenses()
    }

    /// Balance given what has been paid so far.
    pub fn balance_after(&self, paid: Money) -> Money {
        self.total_with_expenses() - paid
    }
}

/// Paid/balance/status after a payment is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub paid: Money,
    pub balance: Money,
    pub status: BillStatus,
}

/// Status a live bill takes for a given balance.
#[inline]
pub fn status_for_balance(balance: Money) -> BillStatus {
    if balance.cents() <= 0 {
        BillStatus::Paid
    } else {
        BillStatus::Pending
    }
}

/// Validates a payment against the bill and computes the new totals.
///
/// The caller persists the payment row and the outcome together.
///
/// ## Example
/// ```rust
/// use atelier_core::ledger::{apply_payment, BillCharges};
/// use atelier_core::money::Money;
/// use atelier_core::types::BillStatus;
///
/// let charges = BillCharges {
///     total_amount: Money::from_cents(100_000),
///     ..Default::default()
/// };
/// let outcome = apply_payment(&charges, Money::zero(), Money::from_cents(100_000)).unwrap();
/// assert_eq!(outcome.status, BillStatus::Paid);
/// assert!(outcome.balance.is_zero());
/// ```
pub fn apply_payment(
    charges: &BillCharges,
    current_paid: Money,
    amount: Money,
) -> CoreResult<PaymentOutcome> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into());
    }

    let balance = charges.balance_after(current_paid);
    if amount > balance {
        return Err(CoreError::PaymentExceedsBalance { balance });
    }

    let paid = current_paid + amount;
    let balance = charges.balance_after(paid);

    Ok(PaymentOutcome {
        paid,
        balance,
        status: status_for_balance(balance),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn charges(total: i64, shipping: i64, misc: i64, boxes: i64) -> BillCharges {
        BillCharges {
            total_amount: Money::from_cents(total),
            shipping_charges: Money::from_cents(shipping),
            miscellaneous: Money::from_cents(misc),
            original_box: Money::from_cents(boxes),
        }
    }

    #[test]
    fn test_expenses_sum() {
        let c = charges(100_000, 2_500, 1_000, 500);
        assert_eq!(c.expenses().cents(), 4_000);
        assert_eq!(c.total_with_expenses().cents(), 104_000);
    }

    #[test]
    fn test_full_payment_settles_bill() {
        let c = charges(100_000, 0, 0, 0);
        let outcome = apply_payment(&c, Money::zero(), Money::from_cents(100_000)).unwrap();
        assert_eq!(outcome.paid.cents(), 100_000);
        assert_eq!(outcome.balance.cents(), 0);
        assert_eq!(outcome.status, BillStatus::Paid);

        let err = apply_payment(&c, outcome.paid, Money::from_cents(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Payment amount exceeds the outstanding balance. Maximum allowed: 0.00"
        );
    }

    #[test]
    fn test_partial_payment_stays_pending() {
        let c = charges(100_000, 5_000, 0, 0);
        let outcome = apply_payment(&c, Money::from_cents(20_000), Money::from_cents(30_000)).unwrap();
        assert_eq!(outcome.paid.cents(), 50_000);
        assert_eq!(outcome.balance.cents(), 55_000);
        assert_eq!(outcome.status, BillStatus::Pending);
    }

    #[test]
    fn test_over_payment_reports_exact_balance() {
        let c = charges(100_000, 0, 0, 0);
        let err = apply_payment(&c, Money::from_cents(85_000), Money::from_cents(20_000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentExceedsBalance { balance } if balance.cents() == 15_000
        ));
    }

    #[test]
    fn test_over_paid_bill_reports_negative_balance() {
        let c = charges(100_000, 0, 0, 0);
        let err = apply_payment(&c, Money::from_cents(102_050), Money::from_cents(100)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentExceedsBalance { balance } if balance.cents() == -2_050
        ));
        assert_eq!(
            err.to_string(),
            "Payment amount exceeds the outstanding balance. Maximum allowed: -20.50"
        );
    }

    #[test]
    fn test_expenses_are_payable() {
        let c = charges(100_000, 1_000, 250, 250);
        assert!(apply_payment(&c, Money::zero(), Money::from_cents(101_500)).is_ok());
        assert!(apply_payment(&c, Money::zero(), Money::from_cents(101_501)).is_err());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let c = charges(100_000, 0, 0, 0);
        assert!(matches!(
            apply_payment(&c, Money::zero(), Money::zero()),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert!(apply_payment(&c, Money::zero(), Money::from_cents(-100)).is_err());
    }

    proptest! {
        #[test]
        fn prop_balance_never_negative(
            total in 0i64..10_000_000,
            shipping in 0i64..100_000,
            payments in proptest::collection::vec(1i64..5_000_000, 0..10),
        ) {
            let c = charges(total, shipping, 0, 0);
            let mut paid = Money::zero();

            for amount in payments {
                match apply_payment(&c, paid, Money::from_cents(amount)) {
                    Ok(outcome) => {
                        prop_assert!(!outcome.balance.is_negative());
                        prop_assert_eq!(outcome.paid + outcome.balance, c.total_with_expenses());
                        prop_assert_eq!(outcome.status, status_for_balance(outcome.balance));
                        paid = outcome.paid;
                    }
                    Err(CoreError::PaymentExceedsBalance { balance }) => {
                        prop_assert_eq!(balance, c.balance_after(paid));
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                }
            }
        }
    }
}
