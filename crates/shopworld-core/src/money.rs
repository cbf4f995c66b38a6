//! Fixed-point money amounts.
//!
//! Prices are `NUMERIC(10, 2)` in the storefront API, so amounts are kept
//! as integer cents and rendered as two-decimal strings (`"799.00"`).

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// A non-negative amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount representable by `NUMERIC(10, 2)`.
    pub const MAX: Money = Money(99_999_999_99);

    pub fn from_cents(cents: i64) -> Result<Self> {
        if !(0..=Self::MAX.0).contains(&cents) {
            return Err(CoreError::invalid_amount(cents.to_string()));
        }
        Ok(Self(cents))
    }

    /// Whole units, e.g. `Money::from_units(799)` is `799.00`.
    pub fn from_units(units: i64) -> Result<Self> {
        units
            .checked_mul(100)
            .ok_or_else(|| CoreError::invalid_amount(units.to_string()))
            .and_then(Self::from_cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0
            .checked_add(other.0)
            .filter(|c| *c <= Self::MAX.0)
            .map(Money)
    }

    /// Unit price times quantity. Negative quantities are rejected.
    pub fn checked_mul(self, quantity: i32) -> Option<Money> {
        if quantity < 0 {
            return None;
        }
        self.0
            .checked_mul(i64::from(quantity))
            .filter(|c| *c <= Self::MAX.0)
            .map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::invalid_amount(s));
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::invalid_amount(s));
        }
        let units: i64 = whole.parse().map_err(|_| CoreError::invalid_amount(s))?;
        let cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| CoreError::invalid_amount(s))? * 10,
            _ => frac.parse::<i64>().map_err(|_| CoreError::invalid_amount(s))?,
        };
        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .ok_or_else(|| CoreError::invalid_amount(s))
            .and_then(Money::from_cents)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount with at most two fraction digits")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Money, E> {
        let units = i64::try_from(v).map_err(E::custom)?;
        Money::from_units(units).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Money, E> {
        Money::from_units(v).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Money, E> {
        // Route through the string form so 19.99 parses as 1999 cents.
        format!("{v:.2}").parse().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!("799".parse::<Money>().unwrap().cents(), 79_900);
        assert_eq!("4.5".parse::<Money>().unwrap().cents(), 450);
        assert_eq!("129.99".parse::<Money>().unwrap().cents(), 12_999);
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "-1", "1.999", "abc", "1.2.3", ".50"] {
            assert!(bad.parse::<Money>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_cents(79_900).unwrap().to_string(), "799.00");
        assert_eq!(Money::from_cents(5).unwrap().to_string(), "0.05");
    }

    #[test]
    fn deserializes_strings_and_numbers() {
        let a: Money = serde_json::from_str("\"249\"").unwrap();
        let b: Money = serde_json::from_str("249").unwrap();
        let c: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(a, b);
        assert_eq!(c.cents(), 1_999);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"249.00\"");
    }

    #[test]
    fn multiplication_rejects_overflow_and_negative_quantity() {
        let price = Money::from_units(1_349).unwrap();
        assert_eq!(price.checked_mul(3).unwrap().cents(), 404_700);
        assert!(price.checked_mul(-1).is_none());
        assert!(Money::MAX.checked_mul(2).is_none());
    }
}
