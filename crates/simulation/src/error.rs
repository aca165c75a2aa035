//! Environment errors.

use lottery_core::TransferError;
use lottery_state::LotteryError;
use lottery_types::Address;
use lottery_vrf::VrfError;

/// Why a call submitted to the environment was reverted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Lottery(#[from] LotteryError),

    #[error(transparent)]
    Vrf(#[from] VrfError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("no lottery deployed")]
    NoLottery,

    #[error("no coordinator deployed")]
    NoCoordinator,

    #[error("a lottery is already deployed at {0}")]
    AlreadyDeployed(Address),

    #[error("no contract at {0}")]
    UnknownContract(Address),
}

impl ChainError {
    /// The lottery error behind this revert, if any.
    pub fn as_lottery(&self) -> Option<&LotteryError> {
        match self {
            ChainError::Lottery(err) => Some(err),
            _ => None,
        }
    }
}
