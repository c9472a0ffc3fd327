//! # Pricing
//!
//! Derives sale prices from a cost basis and a markup rule.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  percentage:  price = cost + cost × value / 100   (banker's rounding)  │
//! │  fixed:       price = cost + value                                      │
//! │                                                                         │
//! │  cost 100.00, percentage 20  →  120.00                                  │
//! │  cost 100.00, fixed 20       →  120.00                                  │
//! │  cost   0.00, percentage 50  →    0.00                                  │
//! │                                                                         │
//! │  A negative result is rejected, never clamped.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentage values are carried in basis points so `12.5%` stays exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{parse_hundredths, Money};

// =============================================================================
// Markup Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MarkupType {
    Percentage,
    Fixed,
}

impl FromStr for MarkupType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => Ok(MarkupType::Percentage),
            "fixed" => Ok(MarkupType::Fixed),
            _ => Err(CoreError::UnknownMarkupType(s.trim().to_string())),
        }
    }
}

// =============================================================================
// Markup
// =============================================================================

/// A parsed markup rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Markup {
    /// Percentage of cost, in basis points (2000 = 20%).
    Percentage { bps: i64 },
    /// Fixed amount added to cost. May be negative (a markdown).
    Fixed { amount: Money },
}

impl Markup {
    /// Parses the `(markupType, markupValue)` pair callers send.
    ///
    /// ```rust
    /// use atelier_core::pricing::Markup;
    ///
    /// assert_eq!(Markup::parse("percentage", "12.5").unwrap(), Markup::Percentage { bps: 1250 });
    /// assert!(Markup::parse("tiered", "10").is_err());
    /// ```
    pub fn parse(markup_type: &str, markup_value: &str) -> CoreResult<Self> {
        let kind: MarkupType = markup_type.parse()?;
        let hundredths = parse_hundredths(markup_value, "markup value")?;

        Ok(match kind {
            MarkupType::Percentage => Markup::Percentage { bps: hundredths },
            MarkupType::Fixed => Markup::Fixed {
                amount: Money::from_cents(hundredths),
            },
        })
    }

    pub fn markup_type(&self) -> MarkupType {
        match self {
            Markup::Percentage { .. } => MarkupType::Percentage,
            Markup::Fixed { .. } => MarkupType::Fixed,
        }
    }

    /// Applies the rule to a cost.
    pub fn apply(&self, cost: Money) -> CoreResult<Money> {
        compute_price(cost, *self)
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Markup::Percentage { bps } => {
                let pct = Money::from_cents(*bps);
                write!(f, "{}%", pct)
            }
            Markup::Fixed { amount } if amount.is_negative() => write!(f, "{}", amount),
            Markup::Fixed { amount } => write!(f, "+{}", amount),
        }
    }
}

/// Computes a sale price from a cost and a markup.
///
/// ## Errors
/// - `ValidationError::MustNotBeNegative` if the cost is negative
/// - `CoreError::NegativePrice` if the markup drives the price below zero
pub fn compute_price(cost: Money, markup: Markup) -> CoreResult<Money> {
    if cost.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "cost price".to_string(),
        }
        .into());
    }

    let price = match markup {
        Markup::Percentage { bps } => cost + cost.apply_basis_points(bps),
        Markup::Fixed { amount } => cost + amount,
    };

    if price.is_negative() {
        return Err(CoreError::NegativePrice { computed: price });
    }

    Ok(price)
}

// =============================================================================
// Price Field
// =============================================================================

/// Which of a product's three sale prices a markup is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Wholesale,
    Reseller,
    Retail,
}

impl PriceField {
    pub const ALL: [PriceField; 3] = [PriceField::Wholesale, PriceField::Reseller, PriceField::Retail];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PriceField::Wholesale => "wholesale",
            PriceField::Reseller => "reseller",
            PriceField::Retail => "retail",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `wholesale`, `wholesalePrice` and `wholesale_price` spellings.
impl FromStr for PriceField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "");
        let normalized = normalized.strip_suffix("price").unwrap_or(&normalized);

        PriceField::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::NotAllowed {
                    field: "price field".to_string(),
                    allowed: PriceField::ALL
                        .iter()
                        .map(|field| field.as_str().to_string())
                        .collect(),
                }
                .into()
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    #[test]
    fn test_reference_prices() {
        let pct = Markup::parse("percentage", "20").unwrap();
        let fixed = Markup::parse("fixed", "20").unwrap();

        assert_eq!(compute_price(money("100"), pct).unwrap(), money("120"));
        assert_eq!(compute_price(money("100"), fixed).unwrap(), money("120"));
        assert_eq!(
            compute_price(money("0"), Markup::parse("percentage", "50").unwrap()).unwrap(),
            Money::zero()
        );
    }

    #[test]
    fn test_zero_markup_keeps_cost() {
        let cost = money("4999.99");
        assert_eq!(
            compute_price(cost, Markup::Percentage { bps: 0 }).unwrap(),
            cost
        );
        assert_eq!(
            compute_price(cost, Markup::Fixed { amount: Money::zero() }).unwrap(),
            cost
        );
    }

    #[test]
    fn test_fractional_percentage_rounds_half_even() {
        // 0.10 × 12.5% = 0.0125 → 0.01
        let markup = Markup::parse("percentage", "12.5").unwrap();
        assert_eq!(compute_price(money("0.10"), markup).unwrap(), money("0.11"));
        // 1.00 × 12.5% = 0.125 → 0.12 (tie to even)
        assert_eq!(compute_price(money("1.00"), markup).unwrap(), money("1.12"));
    }

    #[test]
    fn test_negative_result_rejected() {
        let markdown = Markup::parse("fixed", "-150").unwrap();
        let err = compute_price(money("100"), markdown).unwrap_err();
        assert!(matches!(err, CoreError::NegativePrice { computed } if computed == money("-50")));

        // A markdown that stays at or above zero is fine
        assert_eq!(
            compute_price(money("100"), Markup::parse("fixed", "-100").unwrap()).unwrap(),
            Money::zero()
        );

        let wipeout = Markup::parse("percentage", "-150").unwrap();
        assert!(compute_price(money("100"), wipeout).is_err());
    }

    #[test]
    fn test_unknown_markup_type() {
        let err = Markup::parse("tiered", "5").unwrap_err();
        assert!(matches!(err, CoreError::UnknownMarkupType(t) if t == "tiered"));
        assert_eq!(
            Markup::parse("PERCENTAGE", "5").unwrap().markup_type(),
            MarkupType::Percentage
        );
    }

    #[test]
    fn test_malformed_markup_value() {
        assert!(matches!(
            Markup::parse("fixed", "ten"),
            Err(CoreError::Validation(_))
        ));
        assert!(Markup::parse("percentage", "1.005").is_err());
    }

    #[test]
    fn test_negative_cost_rejected() {
        assert!(compute_price(Money::from_cents(-1), Markup::Percentage { bps: 0 }).is_err());
    }

    #[test]
    fn test_price_field_parsing() {
        assert_eq!("retail".parse::<PriceField>().unwrap(), PriceField::Retail);
        assert_eq!(
            "wholesalePrice".parse::<PriceField>().unwrap(),
            PriceField::Wholesale
        );
        assert_eq!(
            "reseller_price".parse::<PriceField>().unwrap(),
            PriceField::Reseller
        );
        assert!("msrp".parse::<PriceField>().is_err());
    }

    #[test]
    fn test_markup_display() {
        assert_eq!(Markup::Percentage { bps: 1250 }.to_string(), "12.50%");
        assert_eq!(
            Markup::Fixed {
                amount: Money::from_cents(2000)
            }
            .to_string(),
            "+20.00"
        );
    }
}
