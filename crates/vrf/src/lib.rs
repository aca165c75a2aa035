//! Randomness oracle client.
//!
//! This crate implements the coordinator side of the asynchronous
//! request/fulfill randomness protocol as a pure, synchronous state machine:
//!
//! - Subscriptions: prepaid billing accounts with a consumer allow-list
//! - Requests: validated, assigned sequential ids, kept in a pending table
//! - Fulfillment: derives (or accepts) random words, invokes the consumer
//!   callback, bills the subscription and consumes the pending entry
//!
//! The coordinator never calls consumers on its own. Accepted requests show
//! up as [`Action::DeliverRandomness`](lottery_core::Action) and the runner
//! decides when the answer arrives.

mod coordinator;
mod error;

pub use coordinator::{
    CoordinatorConfig, FulfillmentReceipt, PendingRequest, Subscription, VrfCoordinator,
    DEFAULT_BASE_FEE, MAX_CONSUMERS,
};
pub use error::VrfError;
