//! Native currency amounts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of decimals in one whole unit of the native currency.
pub const ETHER_DECIMALS: u32 = 18;

/// Errors produced while parsing amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,

    #[error("invalid amount {0:?}")]
    Invalid(String),

    #[error("amount {0:?} has more than 18 decimal places")]
    TooPrecise(String),

    #[error("amount {0:?} overflows")]
    Overflow(String),
}

/// An amount of the native currency in its smallest unit (wei).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Wei(pub u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    /// One whole unit (10^18 wei).
    pub const ONE_ETHER: Wei = Wei(1_000_000_000_000_000_000);

    /// Parse a decimal amount of whole units, e.g. `"0.1"` → 10^17 wei.
    pub fn parse_ether(s: &str) -> Result<Self, AmountParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountParseError::Invalid(s.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountParseError::Invalid(s.to_string()));
        }
        if frac.len() > ETHER_DECIMALS as usize {
            return Err(AmountParseError::TooPrecise(s.to_string()));
        }

        let overflow = || AmountParseError::Overflow(s.to_string());
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut frac_wei: u128 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| overflow())?
        };
        frac_wei *= 10u128.pow(ETHER_DECIMALS - frac.len() as u32);

        whole
            .checked_mul(Self::ONE_ETHER.0)
            .and_then(|w| w.checked_add(frac_wei))
            .map(Wei)
            .ok_or_else(overflow)
    }

    /// Format as a decimal number of whole units without trailing zeros.
    pub fn format_ether(&self) -> String {
        let whole = self.0 / Self::ONE_ETHER.0;
        let frac = self.0 % Self::ONE_ETHER.0;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:018}", frac);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }

    pub fn checked_sub(self, other: Wei) -> Option<Wei> {
        self.0.checked_sub(other.0).map(Wei)
    }

    pub fn checked_mul(self, factor: u64) -> Option<Wei> {
        self.0.checked_mul(factor as u128).map(Wei)
    }

    /// Sum of `amounts`, or `None` on overflow.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Wei>) -> Option<Wei> {
        amounts
            .into_iter()
            .try_fold(Wei::ZERO, |total, amount| total.checked_add(amount))
    }

    pub fn saturating_sub(self, other: Wei) -> Wei {
        Wei(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

impl FromStr for Wei {
    type Err = AmountParseError;

    /// Parses a plain integer wei amount.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        s.parse::<u128>()
            .map(Wei)
            .map_err(|_| AmountParseError::Invalid(s.to_string()))
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Wei(value)
    }
}


// Amounts travel as decimal strings; u128 does not survive JSON number parsing.
impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
