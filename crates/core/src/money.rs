//! Fixed-point monetary amounts.
//!
//! `Money` wraps [`rust_decimal::Decimal`] and enforces exactly two
//! fractional digits at every construction site. No floating-point
//! arithmetic on money anywhere in this workspace.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A monetary amount with exactly two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

/// Number of fractional digits every `Money` value is rescaled to.
pub const SCALE: u32 = 2;

impl Money {
    /// The zero amount.
    pub fn zero() -> Self {
        Money(Decimal::new(0, SCALE))
    }

    /// Builds a `Money` from separate major and minor units (e.g.
    /// `from_major_minor(150, 0)` for 150.00).
    pub fn from_major_minor(major: i64, minor: i64) -> Self {
        let cents = major * 100 + minor;
        Money(Decimal::new(cents, SCALE))
    }

    /// Builds a `Money` value from a decimal string, rescaling to two
    /// fractional digits. Rejects values that would lose precision (more
    /// than two fractional digits supplied).
    pub fn parse(s: &str) -> Result<Self, crate::error::Error> {
        let d: Decimal = s
            .parse()
            .map_err(|e| crate::error::Error::internal(format!("invalid money literal: {e}")))?;
        Self::from_decimal(d)
    }

    /// Wraps a [`Decimal`], rescaling to two fractional digits. Rejects input
    /// carrying more precision than that (a caller bug, not user input —
    /// user-supplied amounts are parsed and validated at the API boundary).
    pub fn from_decimal(d: Decimal) -> Result<Self, crate::error::Error> {
        if d.scale() > SCALE {
            return Err(crate::error::Error::internal(format!(
                "money value {d} has more than {SCALE} fractional digits"
            )));
        }
        let mut rescaled = d;
        rescaled.rescale(SCALE);
        Ok(Money(rescaled))
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// True if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// True if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Checked addition; `None` only on decimal overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked subtraction; `None` only on decimal overflow.
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// True if `self` is an exact multiple of `step`.
    pub fn is_multiple_of(&self, step: Money) -> bool {
        if step.0.is_zero() {
            return false;
        }
        (self.0 % step.0).is_zero()
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescales_to_two_digits() {
        let m = Money::parse("10").unwrap();
        assert_eq!(m.to_string(), "10.00");
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(Money::parse("10.001").is_err());
    }

    #[test]
    fn addition_and_subtraction() {
        let a = Money::from_major_minor(100, 0);
        let b = Money::from_major_minor(50, 50);
        assert_eq!((a - b).to_string(), "49.50");
        assert_eq!((a + b).to_string(), "150.50");
    }

    #[test]
    fn multiple_of() {
        let amount = Money::from_major_minor(300, 0);
        let step = Money::from_major_minor(100, 0);
        assert!(amount.is_multiple_of(step));
        let odd = Money::from_major_minor(250, 0);
        assert!(!odd.is_multiple_of(step));
    }

    #[test]
    fn ordering_is_numeric() {
        let small = Money::from_major_minor(1, 0);
        let big = Money::from_major_minor(2, 0);
        assert!(small < big);
    }
}
