//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  Reports must satisfy Σ(channel totals) == summary total. With floats  │
//! │  the grouping order changes the result; with integer cents it cannot.  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "12.50" ──parse_decimal──► 1250 cents ──► stored, summed, compared  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! let total = price * 2;
//! assert_eq!(total.cents(), 2198);
//!
//! let parsed = Money::parse_decimal("10.99").unwrap();
//! assert_eq!(parsed, price);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// Product.cost_price_cents ──► Order.unit_cost_cents (frozen)
///                                        │
/// Order.actual_price_cents × quantity ───┴──► Order.profit_cents (frozen)
///                                                    │
///                                                    ▼
///                                   Report summary / channel / product / day
/// ```
///
/// Signed, because profit may be negative when an item sells below cost.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a quantity, failing instead of wrapping.
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(&self, other: Money) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// The profit model shared by the stock engine and the reports.
    ///
    /// `profit = (actual_price − unit_cost) × quantity`
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let profit = Money::profit(Money::from_cents(1500), Money::from_cents(1000), 2).unwrap();
    /// assert_eq!(profit.cents(), 1000);
    ///
    /// // Selling below cost is allowed and yields a negative snapshot
    /// let loss = Money::profit(Money::from_cents(800), Money::from_cents(1000), 3).unwrap();
    /// assert_eq!(loss.cents(), -600);
    /// ```
    pub fn profit(actual_price: Money, unit_cost: Money, quantity: i64) -> CoreResult<Money> {
        actual_price
            .checked_sub(unit_cost)
            .and_then(|margin| margin.checked_mul_quantity(quantity))
            .ok_or_else(|| CoreError::Overflow("profit".to_string()))
    }

    /// `part / whole × 100`, or 0 when `whole` is zero.
    ///
    /// Used for profit margins; the result is for display and ratios only,
    /// never stored.
    pub fn percent_of(part: Money, whole: Money) -> f64 {
        if whole.is_zero() {
            return 0.0;
        }
        part.0 as f64 / whole.0 as f64 * 100.0
    }

    /// Parses decimal text such as `"12"`, `"12.5"`, `"-3.25"` into cents.
    ///
    /// ## Rules
    /// - Optional leading `+`/`-`, then digits, then optionally `.` and at
    ///   most two fractional digits
    /// - No floating point is involved at any step
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("12.5").unwrap().cents(), 1250);
    /// assert_eq!(Money::parse_decimal("0.07").unwrap().cents(), 7);
    /// assert!(Money::parse_decimal("1.234").is_err());
    /// assert!(Money::parse_decimal("abc").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        Self::parse_decimal_field(input, "amount")
    }

    /// Same as [`Money::parse_decimal`], naming `field` in the error.
    pub fn parse_decimal_field(input: &str, field: &str) -> Result<Money, ValidationError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ValidationError::required(field));
        }

        let (negative, unsigned) = match text.as_bytes()[0] {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };

        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
            return Err(ValidationError::invalid(field, format!("'{text}' is not a number")));
        }
        if fraction.len() > 2 {
            return Err(ValidationError::invalid(
                field,
                "at most two decimal places are allowed",
            ));
        }

        let overflow = || ValidationError::invalid(field, "amount is too large");

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .map_err(|_| overflow())?
                .checked_mul(100)
                .ok_or_else(overflow)?
        };
        let fraction_cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => fraction.parse::<i64>().map_err(|_| overflow())?,
        };

        let cents = whole_cents.checked_add(fraction_cents).ok_or_else(overflow)?;
        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`"10.99"`, `"-5.50"`), currency-agnostic.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, Money::from_cents(-200)].into_iter().sum();
        assert_eq!(total.cents(), 1300);
    }

    #[test]
    fn test_profit_model() {
        let profit = Money::profit(Money::from_cents(1500), Money::from_cents(1000), 2).unwrap();
        assert_eq!(profit.cents(), 1000);

        let loss = Money::profit(Money::zero(), Money::from_cents(250), 4).unwrap();
        assert_eq!(loss.cents(), -1000);

        let overflow = Money::profit(Money::from_cents(i64::MAX), Money::zero(), 2);
        assert!(matches!(overflow, Err(CoreError::Overflow(_))));
    }

    #[test]
    fn test_percent_of_never_divides_by_zero() {
        assert_eq!(Money::percent_of(Money::from_cents(100), Money::zero()), 0.0);
        let margin = Money::percent_of(Money::from_cents(250), Money::from_cents(1000));
        assert!((margin - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse_decimal("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse_decimal("10.05").unwrap().cents(), 1005);
        assert_eq!(Money::parse_decimal(" 0.99 ").unwrap().cents(), 99);
        assert_eq!(Money::parse_decimal(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse_decimal("-3.25").unwrap().cents(), -325);
        assert_eq!(Money::parse_decimal("+7").unwrap().cents(), 700);

        assert!(matches!(
            Money::parse_decimal(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(Money::parse_decimal("1.234").is_err());
        assert!(Money::parse_decimal("1,50").is_err());
        assert!(Money::parse_decimal("-").is_err());
        assert!(Money::parse_decimal(".").is_err());
        assert!(Money::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(1234)).unwrap();
        assert_eq!(json, "1234");
        let back: Money = serde_json::from_str("-50").unwrap();
        assert_eq!(back.cents(), -50);
    }
}
