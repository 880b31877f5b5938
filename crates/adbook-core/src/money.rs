//! # Money Module
//!
//! Monetary values in the smallest currency unit (cents), integer only.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:  0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Rates, net amounts and order totals all flow through i64 cents.     │
//! │    Summing a 40-item order is exact, every time.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// A monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for credits/adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checked addition; `None` on i64 overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Sums an iterator of cent amounts with overflow checking.
    ///
    /// Used by the orchestrator to compute order totals from item rates.
    pub fn checked_sum<I: IntoIterator<Item = i64>>(rates: I) -> Option<Money> {
        rates
            .into_iter()
            .try_fold(Money::zero(), |acc, c| acc.checked_add(Money::from_cents(c)))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl fmt::Display for Money {
    /// Formats as dollars for logs and notification text, e.g. `$10.99`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_sum() {
        let total = Money::checked_sum([2500, 5000, 1500]).unwrap();
        assert_eq!(total.cents(), 9000);

        assert!(Money::checked_sum([i64::MAX, 1]).is_none());
        assert_eq!(Money::checked_sum(std::iter::empty()).unwrap(), Money::zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }
}
