//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every price, subtotal, tax and total is an i64 count of cents.      │
//! │    Percentages are integer basis points (1600 = 16%).                  │
//! │    Rounding happens in exactly one place: `Money::percent_of`.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use saori_core::money::Money;
//! use saori_core::types::Percent;
//!
//! let price = Money::from_cents(10_000); // $100.00
//! let gross = price.multiply_quantity(2);
//! let tax = gross.percent_of(Percent::from_bps(1600));
//! assert_eq!(tax.cents(), 3_200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// Signed so that differences (change due, refunds) stay representable.
/// Serializes as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
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

    /// Returns the major unit (pesos) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `rate` of this amount, rounded half away from zero to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps ± 5000) / 10000`.
    /// The ±5000 provides rounding (5000/10000 = 0.5). i128 keeps large
    /// totals from overflowing.
    ///
    /// ## Example
    /// ```rust
    /// use saori_core::money::Money;
    /// use saori_core::types::Percent;
    ///
    /// // 16% of $0.03 = 0.48 cents → 0
    /// assert_eq!(Money::from_cents(3).percent_of(Percent::from_bps(1600)).cents(), 0);
    /// // 16% of $0.04 = 0.64 cents → 1
    /// assert_eq!(Money::from_cents(4).percent_of(Percent::from_bps(1600)).cents(), 1);
    /// ```
    pub fn percent_of(&self, rate: Percent) -> Money {
        let scaled = self.0 as i128 * rate.bps() as i128;
        let half = if scaled < 0 { -5000 } else { 5000 };
        Money::from_cents(((scaled + half) / 10000) as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// Unchecked: callers bound both sides with `validate_price` and
    /// `validate_quantity` first.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `self - other`, floored at zero.
    #[inline]
    pub fn saturating_sub_to_zero(&self, other: Money) -> Money {
        if self.0 > other.0 {
            Money(self.0 - other.0)
        } else {
            Money::zero()
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `$1234.50`. Used in activity log messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money(cents)
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
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(23_200).to_string(), "$232.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 10% of $0.05 = 0.5 cents → 1
        let tax = Money::from_cents(5).percent_of(Percent::from_bps(1000));
        assert_eq!(tax.cents(), 1);

        // 16% of $200.00 = $32.00
        let tax = Money::from_cents(20_000).percent_of(Percent::from_bps(1600));
        assert_eq!(tax.cents(), 3_200);
    }

    #[test]
    fn test_percent_of_negative_amount_is_symmetric() {
        let rate = Percent::from_bps(1000);
        assert_eq!(Money::from_cents(-5).percent_of(rate).cents(), -1);
    }

    #[test]
    fn test_saturating_sub_to_zero() {
        let paid = Money::from_cents(25_000);
        let total = Money::from_cents(23_200);
        assert_eq!(paid.saturating_sub_to_zero(total).cents(), 1_800);
        assert_eq!(total.saturating_sub_to_zero(paid).cents(), 0);
    }
}
