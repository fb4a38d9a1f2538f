// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Numeric literal values.
//!
//! Integers are arbitrary precision. Rationals are kept as reduced
//! numerator/denominator pairs so `1.5r` is exactly `3/2`.

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Num, One, Signed, Zero};

/// An exact rational number in lowest terms with a positive denominator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: BigInt,
    denominator: BigInt,
}

impl Rational {
    /// Creates a rational and reduces it.
    ///
    /// Returns `None` if `denominator` is zero.
    #[must_use]
    pub fn new(numerator: BigInt, denominator: BigInt) -> Option<Self> {
        if denominator.is_zero() {
            return None;
        }
        let divisor = numerator.gcd(&denominator);
        let (mut numerator, mut denominator) = (numerator / &divisor, denominator / &divisor);
        if denominator.is_negative() {
            numerator = -numerator;
            denominator = -denominator;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    /// Creates a whole-number rational.
    #[must_use]
    pub fn from_integer(value: BigInt) -> Self {
        Self {
            numerator: value,
            denominator: BigInt::one(),
        }
    }

    /// Parses the digits of a decimal literal such as `1.5` exactly.
    #[must_use]
    pub fn from_decimal(digits: &str) -> Option<Self> {
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let scale = u32::try_from(fraction.len()).ok()?;
        let numerator = BigInt::from_str_radix(&format!("{whole}{fraction}"), 10).ok()?;
        Self::new(numerator, BigInt::from(10u32).pow(scale))
    }

    /// Returns the numerator.
    #[must_use]
    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    /// Returns the denominator.
    #[must_use]
    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    fn negate(&self) -> Self {
        Self {
            numerator: -&self.numerator,
            denominator: self.denominator.clone(),
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// The value of a real numeric literal.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    /// An integer.
    Integer(BigInt),
    /// A float.
    Float(f64),
    /// A rational (`r` suffix).
    Rational(Rational),
}

impl NumericValue {
    /// Returns the negated value.
    #[must_use]
    pub fn negate(&self) -> Self {
        match self {
            Self::Integer(value) => Self::Integer(-value),
            Self::Float(value) => Self::Float(-value),
            Self::Rational(value) => Self::Rational(value.negate()),
        }
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Rational(value) => write!(f, "({value})"),
        }
    }
}

/// A numeric literal token payload: a value plus the imaginary suffix flag.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericLiteral {
    /// The real value.
    pub value: NumericValue,
    /// Whether the literal carried an `i` suffix.
    pub imaginary: bool,
}

impl NumericLiteral {
    /// Returns the literal negated.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            value: self.value.negate(),
            imaginary: self.imaginary,
        }
    }
}

impl fmt::Display for NumericLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if self.imaginary {
            f.write_str("i")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_reduces() {
        let r = Rational::new(BigInt::from(15), BigInt::from(10)).unwrap();
        assert_eq!(r.numerator(), &BigInt::from(3));
        assert_eq!(r.denominator(), &BigInt::from(2));
    }

    #[test]
    fn rational_normalizes_sign() {
        let r = Rational::new(BigInt::from(1), BigInt::from(-2)).unwrap();
        assert_eq!(r.to_string(), "-1/2");
        let r = Rational::new(BigInt::from(6), BigInt::from(-4)).unwrap();
        assert_eq!(r.to_string(), "-3/2");
        let r = Rational::new(BigInt::from(-6), BigInt::from(-4)).unwrap();
        assert_eq!(r.to_string(), "3/2");
    }

    #[test]
    fn rational_zero_denominator_is_none() {
        assert!(Rational::new(BigInt::from(1), BigInt::zero()).is_none());
    }

    #[test]
    fn rational_from_decimal() {
        assert_eq!(Rational::from_decimal("1.5").unwrap().to_string(), "3/2");
        assert_eq!(Rational::from_decimal("0.25").unwrap().to_string(), "1/4");
        assert_eq!(Rational::from_decimal("7").unwrap().to_string(), "7/1");
    }

    #[test]
    fn zero_rational_has_unit_denominator() {
        assert_eq!(Rational::from_decimal("0.0").unwrap().to_string(), "0/1");
    }

    #[test]
    fn negate_values() {
        assert_eq!(
            NumericValue::Integer(BigInt::from(2)).negate(),
            NumericValue::Integer(BigInt::from(-2))
        );
        assert_eq!(
            NumericValue::Float(1.5).negate(),
            NumericValue::Float(-1.5)
        );
    }
}
