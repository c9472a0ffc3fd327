//! # Money Module
//!
//! Provides the `Money` type for every amount in the marketplace: cost
//! prices, sale prices, bill totals, expenses and payments.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Bill total 1000.10 + shipping 0.20 = 1000.3000000000001  ❌            │
//! │  Balance check "amount > balance" then fails on a cent that            │
//! │  does not exist.                                                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    100010 + 20 = 100030 cents, exactly                                 │
//! │    Every division (markups, expense sharing) rounds half to even       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atelier_core::money::Money;
//!
//! let cost = Money::parse("1250.50").unwrap();
//! assert_eq!(cost.cents(), 125050);
//!
//! // 20% markup, rounded half to even
//! let price = cost + cost.apply_basis_points(2000);
//! assert_eq!(price.to_string(), "1500.60");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents / paise).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values show up transiently (a negative fixed
///   markup, an over-paid balance) and are rejected by the callers that care
/// - **Serialized as the raw integer**: the front-ends format for display
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use atelier_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal string such as `"1000"`, `"12.5"` or `"-3.75"`.
    ///
    /// At most two fractional digits are accepted; anything finer would
    /// need a rounding decision the caller has not made.
    ///
    /// ```rust
    /// use atelier_core::money::Money;
    ///
    /// assert_eq!(Money::parse("12.5").unwrap().cents(), 1250);
    /// assert!(Money::parse("12.505").is_err());
    /// assert!(Money::parse("twelve").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_hundredths(input, "amount").map(Money)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns `self * bps / 10000`, rounded half to even.
    ///
    /// ## Bankers Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Round half to even: 0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4            │
    /// │  Ties alternate direction, so re-pricing a whole catalog does not  │
    /// │  drift upward by half a cent per product.                          │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ```rust
    /// use atelier_core::money::Money;
    ///
    /// // 12.5% of 1.00 = 0.125 → 0.12 (tie, 12 is even)
    /// assert_eq!(Money::from_cents(100).apply_basis_points(1250).cents(), 12);
    /// // 13.5% of 1.00 = 0.135 → 0.14 (tie, 14 is even)
    /// assert_eq!(Money::from_cents(100).apply_basis_points(1350).cents(), 14);
    /// ```
    pub fn apply_basis_points(&self, bps: i64) -> Money {
        let scaled = self.0 as i128 * bps as i128;
        Money(div_round_half_even(scaled, 10_000) as i64)
    }

    /// Returns `self * numerator / denominator`, rounded half to even.
    ///
    /// Used for proportional splits. A zero denominator yields zero.
    pub fn mul_div(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let (num, den) = if denominator < 0 {
            (-(self.0 as i128 * numerator as i128), -(denominator as i128))
        } else {
            (self.0 as i128 * numerator as i128, denominator as i128)
        };
        Money(div_round_half_even(num, den) as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Formats with a currency symbol in front, e.g. `₹1250.00`.
    ///
    /// No digit grouping; localized display belongs to the front-ends.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }
}

/// Integer division of `num` by a positive `den`, rounding half to even.
pub(crate) fn div_round_half_even(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);
    let quotient = num.div_euclid(den);
    let twice_remainder = 2 * num.rem_euclid(den);

    if twice_remainder > den || (twice_remainder == den && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

/// Parses a decimal with at most two fractional digits into hundredths.
///
/// Shared by [`Money::parse`] (cents) and percentage markups (basis points).
pub fn parse_hundredths(input: &str, field: &str) -> Result<i64, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("must be a decimal number"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("must be a decimal number"));
    }
    if fraction.len() > 2 {
        return Err(invalid("at most 2 decimal places are allowed"));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("value is too large"))?
    };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid("must be a decimal number"))? * 10,
        _ => fraction.parse().map_err(|_| invalid("must be a decimal number"))?,
    };

    let value = whole_value
        .checked_mul(100)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(|| invalid("value is too large"))?;

    Ok(if negative { -value } else { value })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering, e.g. `1250.00` or `-3.75`.
///
/// This is the form used in user-facing error messages such as the
/// over-payment rejection.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
