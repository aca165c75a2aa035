//! Construction parameters.

use crate::LotteryError;
use lottery_core::{RandomWordsRequest, NUM_WORDS, REQUEST_CONFIRMATIONS};
use lottery_types::{Address, GasLane, SubscriptionId, Wei};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable lottery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// Coordinator the lottery requests randomness from.
    pub vrf_coordinator: Address,

    /// Minimum payment accepted by `enter`.
    pub entrance_fee: Wei,

    /// Gas price lane for randomness requests.
    pub gas_lane: GasLane,

    /// Subscription billed for fulfillments.
    pub subscription_id: SubscriptionId,

    /// Gas the fulfillment callback may use.
    pub callback_gas_limit: u32,

    /// Minimum round duration before upkeep is due.
    pub interval: Duration,
}

impl LotteryConfig {
    /// Configuration with the default lane, subscription 0 and a 500k
    /// callback limit.
    pub fn new(vrf_coordinator: Address, entrance_fee: Wei, interval: Duration) -> Self {
        Self {
            vrf_coordinator,
            entrance_fee,
            gas_lane: GasLane::default(),
            subscription_id: SubscriptionId(0),
            callback_gas_limit: 500_000,
            interval,
        }
    }

    pub fn with_gas_lane(mut self, gas_lane: GasLane) -> Self {
        self.gas_lane = gas_lane;
        self
    }

    pub fn with_subscription_id(mut self, subscription_id: SubscriptionId) -> Self {
        self.subscription_id = subscription_id;
        self
    }

    pub fn with_callback_gas_limit(mut self, limit: u32) -> Self {
        self.callback_gas_limit = limit;
        self
    }

    /// Reject configurations the round logic cannot run with.
    pub fn validate(&self) -> Result<(), LotteryError> {
        if self.entrance_fee.is_zero() {
            return Err(LotteryError::InvalidConfig("entrance fee must be positive"));
        }
        if self.interval.is_zero() {
            return Err(LotteryError::InvalidConfig("interval must be positive"));
        }
        Ok(())
    }

    /// The request submitted on every upkeep.
    pub fn randomness_request(&self) -> RandomWordsRequest {
        RandomWordsRequest {
            gas_lane: self.gas_lane,
            subscription_id: self.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: self.callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }
}
