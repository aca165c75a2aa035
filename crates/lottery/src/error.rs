//! Lottery errors.

use lottery_core::{RequestRejected, TransferError};
use lottery_types::{Address, LotteryState, RequestId, Wei};

/// Reasons a lottery call is rejected.
///
/// The display strings of the first four variants are the revert
/// identifiers watchers match on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LotteryError {
    #[error("Lottery__SendMoreToEnterLottery")]
    SendMoreToEnterLottery { sent: Wei, required: Wei },

    #[error("Lottery__LotteryNotOpen")]
    LotteryNotOpen,

    #[error("Lottery__UpkeepNotNeeded({balance}, {num_players}, {})", .state.as_u8())]
    UpkeepNotNeeded {
        balance: Wei,
        num_players: usize,
        state: LotteryState,
    },

    #[error("Lottery__TransferFailed")]
    TransferFailed {
        winner: Address,
        #[source]
        source: TransferError,
    },

    /// The id does not match the outstanding request.
    #[error("nonexistent request")]
    NonexistentRequest(RequestId),

    #[error("fulfillment carried no random words")]
    MissingRandomWords,

    #[error("player index {index} out of bounds ({len} players)")]
    PlayerIndexOutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    RandomnessRequest(#[from] RequestRejected),

    #[error("round balance overflow")]
    BalanceOverflow,

    #[error("invalid lottery configuration: {0}")]
    InvalidConfig(&'static str),
}

impl LotteryError {
    /// Short identifier for logs and receipts.
    pub fn kind(&self) -> &'static str {
        match self {
            LotteryError::SendMoreToEnterLottery { .. } => "SendMoreToEnterLottery",
            LotteryError::LotteryNotOpen => "LotteryNotOpen",
            LotteryError::UpkeepNotNeeded { .. } => "UpkeepNotNeeded",
            LotteryError::TransferFailed { .. } => "TransferFailed",
            LotteryError::NonexistentRequest(_) => "NonexistentRequest",
            LotteryError::MissingRandomWords => "MissingRandomWords",
            LotteryError::PlayerIndexOutOfBounds { .. } => "PlayerIndexOutOfBounds",
            LotteryError::RandomnessRequest(_) => "RandomnessRequest",
            LotteryError::BalanceOverflow => "BalanceOverflow",
            LotteryError::InvalidConfig(_) => "InvalidConfig",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_identifiers() {
        let err = LotteryError::SendMoreToEnterLottery {
            sent: Wei(1),
            required: Wei(2),
        };
        assert_eq!(err.to_string(), "Lottery__SendMoreToEnterLottery");
        assert_eq!(
            LotteryError::LotteryNotOpen.to_string(),
            "Lottery__LotteryNotOpen"
        );
        assert_eq!(
            LotteryError::NonexistentRequest(RequestId(3)).to_string(),
            "nonexistent request"
        );
    }

    #[test]
    fn test_upkeep_not_needed_carries_diagnostics() {
        let err = LotteryError::UpkeepNotNeeded {
            balance: Wei(100),
            num_players: 2,
            state: LotteryState::Calculating,
        };
        assert_eq!(err.to_string(), "Lottery__UpkeepNotNeeded(100, 2, 1)");
    }
}
