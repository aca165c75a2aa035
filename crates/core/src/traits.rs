//! Traits implemented by state machines and their collaborators.

use crate::{Action, Event, RandomWordsRequest};
use lottery_types::{Address, RequestId, Wei};
use std::time::Duration;

/// A deterministic state machine driven by a runner.
///
/// `handle` must not perform I/O: everything the machine wants done is
/// returned as [`Action`]s.
pub trait StateMachine {
    /// Process one event to completion and return the resulting actions.
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Update the machine's view of the current time.
    fn set_time(&mut self, now: Duration);

    /// The machine's view of the current time.
    fn now(&self) -> Duration;
}

/// The randomness request was not accepted by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("randomness request rejected: {reason}")]
pub struct RequestRejected {
    pub reason: String,
}

/// Submission side of the request/fulfill randomness protocol.
///
/// Submission is synchronous and returns the identifier under which the
/// fulfillment will later arrive; the words themselves are delivered as a
/// separate call.
pub trait RandomnessClient {
    fn request_random_words(
        &mut self,
        consumer: Address,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, RequestRejected>;
}

/// Reasons a value transfer can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("insufficient funds in {account}: have {available:?}, need {required:?}")]
    InsufficientFunds {
        account: Address,
        available: Wei,
        required: Wei,
    },

    /// The recipient refuses incoming value.
    #[error("recipient {0} rejected the transfer")]
    Rejected(Address),

    #[error("balance overflow for {0}")]
    Overflow(Address),
}

/// Account balances the lottery pays out from.
pub trait Ledger {
    fn balance_of(&self, account: &Address) -> Wei;

    /// Move `amount` from `from` to `to`. Either both sides change or neither.
    fn transfer(&mut self, from: Address, to: Address, amount: Wei) -> Result<(), TransferError>;
}
