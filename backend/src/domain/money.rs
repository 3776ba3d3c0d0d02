//! Non-negative currency amounts held as integer minor units.
//!
//! Prices, balances and cart totals all use [`Money`]. Amounts are stored as
//! cents so arithmetic is exact; the textual form is a two-decimal string
//! such as `"9.99"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const CENTS_PER_UNIT: i64 = 100;

/// Validation errors raised when parsing or constructing money.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The amount was below zero.
    #[error("amount must not be negative")]
    Negative,
    /// The text was not a decimal amount with at most two fraction digits.
    #[error("'{0}' is not a valid amount")]
    Malformed(String),
    /// The amount does not fit in the supported range.
    #[error("amount is too large")]
    Overflow,
}

/// Exact, non-negative monetary amount.
///
/// ## Invariants
/// - The wrapped cent count is never negative.
///
/// # Examples
/// ```
/// use storefront::domain::Money;
///
/// let price: Money = "9.99".parse().unwrap();
/// assert_eq!(price.cents(), 999);
/// assert_eq!(price.checked_mul(3).unwrap().to_string(), "29.97");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build an amount from a cent count.
    pub fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Self(cents))
    }

    /// Build an amount from whole currency units.
    pub fn from_units(units: i64) -> Result<Self, MoneyError> {
        let cents = units
            .checked_mul(CENTS_PER_UNIT)
            .ok_or(MoneyError::Overflow)?;
        Self::from_cents(cents)
    }

    /// The amount in cents.
    #[must_use]
    pub fn cents(self) -> i64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Sum two amounts, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtract `other`, or `None` when the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0
            .checked_sub(other.0)
            .filter(|cents| *cents >= 0)
            .map(Self)
    }

    /// Multiply by a quantity, or `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / CENTS_PER_UNIT, self.0 % CENTS_PER_UNIT)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        let malformed = || MoneyError::Malformed(raw.to_owned());
        if text.starts_with('-') {
            return Err(MoneyError::Negative);
        }
        let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) || fraction.len() > 2 {
            return Err(malformed());
        }
        if text.ends_with('.') {
            return Err(malformed());
        }

        let units: i64 = whole.parse().map_err(|_| MoneyError::Overflow)?;
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| malformed())? * 10,
            _ => fraction.parse().map_err(|_| malformed())?,
        };
        let cents = units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|cents| cents.checked_add(fraction_cents))
            .ok_or(MoneyError::Overflow)?;
        Self::from_cents(cents)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Money> for String {
    fn from(value: Money) -> Self {
        value.to_string()
    }
}
