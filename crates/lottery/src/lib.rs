//! Lottery round state machine.
//!
//! A [`Lottery`] owns exactly one [`Round`] for its whole lifetime:
//!
//! ```text
//!   OPEN ──perform_upkeep──▶ CALCULATING ──fulfill_random_words──▶ OPEN
//! ```
//!
//! Commands are synchronous and run to completion. The only asynchronous
//! boundary is randomness: `perform_upkeep` submits a request through a
//! [`RandomnessClient`](lottery_core::RandomnessClient) and the answer comes
//! back later through `fulfill_random_words`, which pays the winner through
//! a [`Ledger`](lottery_core::Ledger).
//!
//! Notifications are returned as [`Action::Emit`](lottery_core::Action)
//! values for the caller to publish.

mod config;
mod error;
mod state;

pub use config::LotteryConfig;
pub use error::LotteryError;
pub use state::{Lottery, RandomnessRequest, Round, UpkeepCheck};
