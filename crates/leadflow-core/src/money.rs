//! # Money Amounts
//!
//! Loan amounts, approved amounts and disbursement tranches are integer
//! counts of minor currency units (paise). Floats never appear: running
//! totals compared against an approved amount must be exact.
//!
//! Textual form is `<major>.<minor:02>` (e.g. `500000.00`). Parsing accepts
//! digit-group separators (`5,00,000`) and up to two decimal places.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A non-negative money amount in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// From minor units (paise).
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// From whole major units (rupees). Saturates at `i64::MAX` minor units.
    pub fn from_major(major: i64) -> Self {
        Self(major.saturating_mul(100))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal string such as `250000`, `2,50,000.5` or `1234.56`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let invalid = |reason: &str| CoreError::InvalidAmount {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ',' | '_' | ' '))
            .collect();
        if cleaned.is_empty() {
            return Err(invalid("empty"));
        }
        if cleaned.starts_with('-') {
            return Err(invalid("amounts cannot be negative"));
        }

        let (whole, frac) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("not a decimal number"));
        }
        if frac.len() > 2 {
            return Err(invalid("more than two decimal places"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => frac.parse().map_err(|_| invalid("bad fraction"))?,
        };

        whole
            .checked_mul(100)
            .and_then(|m| m.checked_add(frac))
            .map(Amount)
            .ok_or_else(|| invalid("too large"))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::str::FromStr for Amount {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.map(|a| a.0).fold(0i64, i64::saturating_add))
    }
}

impl<'a> std::iter::Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
