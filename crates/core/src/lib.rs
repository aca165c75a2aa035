//! Core types for the lottery state machines.
//!
//! This crate provides the vocabulary shared by the lottery, the randomness
//! coordinator and the runners that drive them:
//!
//! - [`Event`]: All possible inputs to the execution environment
//! - [`Action`]: All possible outputs from the state machines
//! - [`EventPriority`]: Ordering priority for events at the same timestamp
//! - [`StateMachine`]: The trait the environment's state machine implements
//! - [`RandomnessClient`] / [`Ledger`]: Collaborators the lottery calls into
//! - [`LotteryEvent`] / [`EventSink`]: Notifications for external listeners
//!
//! # Architecture
//!
//! ```text
//! Events → StateMachine::handle() → Actions
//! ```
//!
//! The state machines are:
//! - **Synchronous**: No async, no .await
//! - **Deterministic**: Same state + event = same actions
//! - **Pure-ish**: Mutate self, but perform no I/O
//!
//! The only asynchronous boundary is randomness: a request is submitted
//! synchronously through [`RandomnessClient`] and the words come back later
//! as a separate [`Event::FulfillRandomWords`].

mod action;
mod event;
mod notification;
mod request;
mod traits;

pub use action::Action;
pub use event::{Event, EventPriority};
pub use notification::{
    CoordinatorEvent, EventRecord, EventSink, LogEvent, LotteryEvent, RecordingSink, TracingSink,
};
pub use request::{Fulfillment, RandomWordsRequest, NUM_WORDS, REQUEST_CONFIRMATIONS};
pub use traits::{
    Ledger, RandomnessClient, RequestRejected, StateMachine, TransferError,
};

/// Timer identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerId {
    /// Automation keeper poll (checkUpkeep → performUpkeep).
    Upkeep,
}
