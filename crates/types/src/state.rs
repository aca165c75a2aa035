//! Lottery round state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the current round accepts entrants.
///
/// The numeric codes are part of the external interface (`0 = OPEN`,
/// `1 = CALCULATING`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum LotteryState {
    /// Accepting entrants; upkeep may trigger.
    #[default]
    Open = 0,
    /// Waiting for the randomness oracle to deliver a fulfillment.
    Calculating = 1,
}

impl LotteryState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_open(self) -> bool {
        matches!(self, LotteryState::Open)
    }
}

impl TryFrom<u8> for LotteryState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LotteryState::Open),
            1 => Ok(LotteryState::Calculating),
            other => Err(other),
        }
    }
}

impl fmt::Display for LotteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotteryState::Open => write!(f, "OPEN"),
            LotteryState::Calculating => write!(f, "CALCULATING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_codes() {
        assert_eq!(LotteryState::Open.as_u8(), 0);
        assert_eq!(LotteryState::Calculating.as_u8(), 1);
        assert_eq!(LotteryState::try_from(1), Ok(LotteryState::Calculating));
        assert_eq!(LotteryState::try_from(2), Err(2));
        assert_eq!(LotteryState::default(), LotteryState::Open);
    }
}
