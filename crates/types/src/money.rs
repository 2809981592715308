//! Integer-cents currency arithmetic.
//!
//! Monetary values are stored as whole cents in an `i64`. Floating point is
//! never used: parsing goes straight from decimal text to cents, and
//! rendering formats the integer parts. This keeps totals exact no matter
//! how many line items are summed.

/// Errors that can occur when constructing a [`Money`] value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MoneyError {
    /// The input was not a plain decimal amount such as `150`, `2.5` or `150.00`.
    #[error("amount is not a valid decimal value")]
    Parse,
    /// The input carried more than two decimal places.
    #[error("amount has more than two decimal places")]
    Precision,
    /// The amount does not fit the supported range.
    #[error("amount is out of range")]
    Overflow,
}

/// An exact currency amount in whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from whole cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in whole cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is strictly greater than zero.
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Adds two amounts, clamping at the numeric range instead of wrapping.
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl std::fmt::Display for Money {
    /// Renders the amount as `12.50` (with a leading `-` for negatives).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl std::str::FromStr for Money {
    type Err = MoneyError;

    /// Parses a decimal amount such as `150`, `2.5` or `150.00` into cents.
    ///
    /// At most two decimal places are accepted; a lone `.` or any
    /// non-digit character is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (s, negative) = match s.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(MoneyError::Parse);
        }
        if frac.len() > 2 {
            return Err(MoneyError::Precision);
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MoneyError::Parse);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyError::Overflow)?
        };
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| MoneyError::Parse)? * 10,
            _ => frac.parse().map_err(|_| MoneyError::Parse)?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or(MoneyError::Overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}
