//! Coordinator errors.

use lottery_core::RequestRejected;
use lottery_types::{Address, RequestId, SubscriptionId, Wei};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VrfError {
    /// No pending request with this id (never requested or already fulfilled).
    #[error("nonexistent request")]
    NonexistentRequest(RequestId),

    #[error("invalid subscription {0}")]
    InvalidSubscription(SubscriptionId),

    #[error("subscription {0} already exists")]
    SubscriptionExists(SubscriptionId),

    #[error("consumer {consumer} is not registered on subscription {subscription_id}")]
    InvalidConsumer {
        subscription_id: SubscriptionId,
        consumer: Address,
    },

    #[error("request {request_id} belongs to {expected}, not {actual}")]
    ConsumerMismatch {
        request_id: RequestId,
        expected: Address,
        actual: Address,
    },

    #[error("subscription {0} already has the maximum number of consumers")]
    TooManyConsumers(SubscriptionId),

    #[error("subscription {subscription_id} balance {balance:?} cannot cover {required:?}")]
    InsufficientBalance {
        subscription_id: SubscriptionId,
        balance: Wei,
        required: Wei,
    },

    #[error("invalid number of words {requested}, allowed 1..={max}")]
    InvalidNumWords { requested: u32, max: u32 },

    #[error("callback gas limit {requested} exceeds {max}")]
    GasLimitTooBig { requested: u32, max: u32 },

    #[error("request confirmations {requested} outside {min}..={max}")]
    InvalidRequestConfirmations { requested: u16, min: u16, max: u16 },

    #[error("expected {expected} random words, got {actual}")]
    InvalidRandomWords { expected: u32, actual: usize },
}

impl From<VrfError> for RequestRejected {
    fn from(err: VrfError) -> Self {
        RequestRejected {
            reason: err.to_string(),
        }
    }
}
