//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CURRENCY_SYMBOL: &str = "৳";

/// Opaque product identifier issued by the catalog backend
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self { Self(value) }
}

/// Money value object. Amounts are always taka.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn from_taka(taka: i64) -> Self { Self(Decimal::from(taka)) }
    pub fn amount(&self) -> Decimal { self.0 }

    // Arithmetic saturates at the Decimal bounds instead of panicking.
    pub fn add(&self, other: &Money) -> Money {
        Money(self.0.checked_add(other.0).unwrap_or_else(|| saturated(self.0.is_sign_negative() && other.0.is_sign_negative())))
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money(self.0.checked_mul(Decimal::from(qty)).unwrap_or_else(|| saturated(self.0.is_sign_negative())))
    }

    /// Renders the amount the way the storefront shows prices: `৳1,25,000.5`.
    /// Integer digits use en-BD (lakh/crore) grouping; fractions are rounded
    /// to two places with trailing zeros dropped.
    pub fn format(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        let text = rounded.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i.to_string(), Some(f.to_string())),
            None => (text, None),
        };
        let mut out = String::from(CURRENCY_SYMBOL);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&group_lakh(&int_part));
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(&frac);
        }
        out
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.format()) }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc.add(&m))
    }
}

fn saturated(negative: bool) -> Decimal {
    if negative { Decimal::MIN } else { Decimal::MAX }
}

fn group_lakh(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (a, b) = rest.split_at(rest.len() - 2);
        groups.push(b);
        rest = a;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Quantity of one product in a cart. Never below one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    /// Returns `None` for zero or negative requests.
    pub fn new(value: i64) -> Option<Self> {
        u32::try_from(value).ok().filter(|v| *v >= 1).map(Self)
    }

    /// Like `new`, but anything below one becomes one.
    pub fn clamped(value: i64) -> Self {
        Self::new(value).unwrap_or(if value > 0 { Self(u32::MAX) } else { Self::ONE })
    }

    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Self { Self(self.0.saturating_add(other.0)) }
}

impl Default for Quantity { fn default() -> Self { Self::ONE } }

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 { Err(QuantityError::Zero) } else { Ok(Self(value)) }
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self { q.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity must be at least 1")]
    Zero,
}

/// Bangladeshi mobile number: `01`, an operator digit 3-9, then eight digits.
/// Whitespace is ignored.
pub fn is_bd_mobile(raw: &str) -> bool {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = digits.as_bytes();
    bytes.len() == 11
        && bytes.iter().all(u8::is_ascii_digit)
        && bytes[0] == b'0'
        && bytes[1] == b'1'
        && (b'3'..=b'9').contains(&bytes[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_format() {
        assert_eq!(Money::from_taka(0).format(), "৳0");
        assert_eq!(Money::from_taka(950).format(), "৳950");
        assert_eq!(Money::from_taka(1500).format(), "৳1,500");
        assert_eq!(Money::from_taka(125000).format(), "৳1,25,000");
        assert_eq!(Money::from_taka(12345678).format(), "৳1,23,45,678");
        assert_eq!(Money::new(Decimal::new(249950, 2)).format(), "৳2,499.5");
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::from_taka(100), Money::from_taka(50)].into_iter().sum();
        assert_eq!(total, Money::from_taka(150));
    }

    #[test]
    fn test_money_saturates_on_overflow() {
        let huge = Money::new(Decimal::from_i128_with_scale(10i128.pow(22), 0));
        assert_eq!(huge.multiply(10_000_000), Money::new(Decimal::MAX));
        assert_eq!(huge.multiply(10_000_000).add(&Money::from_taka(1)), Money::new(Decimal::MAX));
        assert_eq!(Money::new(Decimal::MIN).add(&Money::from_taka(-1)), Money::new(Decimal::MIN));
        assert!(!huge.multiply(u32::MAX).format().is_empty());
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(Quantity::new(0), None);
        assert_eq!(Quantity::new(-2), None);
        assert_eq!(Quantity::new(3).map(|q| q.value()), Some(3));
        assert_eq!(Quantity::clamped(0), Quantity::ONE);
        assert_eq!(Quantity::clamped(-7), Quantity::ONE);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }

    #[test]
    fn test_bd_mobile() {
        assert!(is_bd_mobile("01712345678"));
        assert!(is_bd_mobile("017 1234 5678"));
        assert!(!is_bd_mobile("01212345678"));
        assert!(!is_bd_mobile("0171234567"));
        assert!(!is_bd_mobile("+8801712345678"));
    }
}
