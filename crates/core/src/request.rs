//! Randomness request and fulfillment messages.

use lottery_types::{Address, GasLane, RandomWord, RequestId, SubscriptionId};
use serde::{Deserialize, Serialize};

/// Block confirmations the oracle waits before answering.
///
/// Fixed protocol parameter, not per-network configuration.
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Number of random words requested per round.
pub const NUM_WORDS: u32 = 1;

/// Parameters of a single randomness request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomWordsRequest {
    /// Gas price lane (key hash) the oracle should answer on.
    pub gas_lane: GasLane,
    /// Subscription billed for the fulfillment.
    pub subscription_id: SubscriptionId,
    /// Confirmations to wait before answering.
    pub request_confirmations: u16,
    /// Gas the consumer callback may use.
    pub callback_gas_limit: u32,
    /// How many words to deliver.
    pub num_words: u32,
}

/// Random words delivered for an earlier request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
    pub request_id: RequestId,
    /// Contract that submitted the request and receives the callback.
    pub consumer: Address,
    pub words: Vec<RandomWord>,
}
