//! Coordinator state.

use crate::VrfError;
use lottery_core::{
    Action, CoordinatorEvent, Fulfillment, RandomWordsRequest, RandomnessClient, RequestRejected,
    REQUEST_CONFIRMATIONS,
};
use lottery_types::{Address, Hash, RandomWord, RequestId, SubscriptionId, Wei};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::instrument;

/// Flat fee charged to the subscription per fulfillment (0.25 units).
pub const DEFAULT_BASE_FEE: Wei = Wei(250_000_000_000_000_000);

/// Maximum consumers a single subscription may register.
pub const MAX_CONSUMERS: usize = 100;

/// Coordinator limits and pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Fee charged per fulfillment.
    pub base_fee: Wei,
    /// Upper bound on words per request.
    pub max_num_words: u32,
    /// Upper bound on the consumer callback gas limit.
    pub max_callback_gas_limit: u32,
    /// Minimum confirmations a request may ask for.
    pub min_request_confirmations: u16,
    /// Maximum confirmations a request may ask for.
    pub max_request_confirmations: u16,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            base_fee: DEFAULT_BASE_FEE,
            max_num_words: 500,
            max_callback_gas_limit: 2_500_000,
            min_request_confirmations: REQUEST_CONFIRMATIONS,
            max_request_confirmations: 200,
        }
    }
}

impl CoordinatorConfig {
    /// Set the per-fulfillment fee.
    pub fn with_base_fee(mut self, base_fee: Wei) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// Set the callback gas limit cap.
    pub fn with_max_callback_gas_limit(mut self, limit: u32) -> Self {
        self.max_callback_gas_limit = limit;
        self
    }
}

/// A prepaid billing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub owner: Address,
    pub balance: Wei,
    pub consumers: Vec<Address>,
    /// Fulfillments billed so far.
    pub fulfilled_count: u64,
}

impl Subscription {
    pub fn has_consumer(&self, consumer: &Address) -> bool {
        self.consumers.contains(consumer)
    }
}

/// An accepted request awaiting its fulfillment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub consumer: Address,
    pub request: RandomWordsRequest,
    pub requested_at: Duration,
}

/// Outcome of a fulfillment as recorded by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentReceipt {
    pub request_id: RequestId,
    pub payment: Wei,
    /// Whether the consumer callback accepted the words.
    pub success: bool,
}

/// Mock randomness coordinator.
///
/// Request ids and subscription ids are sequential starting at 1. Random
/// words are derived from the request id so runs are reproducible.
#[derive(Debug)]
pub struct VrfCoordinator {
    /// Contract address of this coordinator.
    address: Address,

    config: CoordinatorConfig,

    subscriptions: BTreeMap<SubscriptionId, Subscription>,

    /// Pending request table. An entry lives from submission until its
    /// fulfillment is delivered; it is never revived.
    pending: BTreeMap<RequestId, PendingRequest>,

    next_subscription_id: u64,

    next_request_id: u64,

    /// Current time.
    now: Duration,

    /// Actions produced by calls that cannot return them directly
    /// (submissions made through [`RandomnessClient`]).
    outbox: Vec<Action>,
}

impl VrfCoordinator {
    /// Create a coordinator at `address`.
    pub fn new(address: Address, config: CoordinatorConfig) -> Self {
        Self {
            address,
            config,
            subscriptions: BTreeMap::new(),
            pending: BTreeMap::new(),
            next_subscription_id: 1,
            next_request_id: 1,
            now: Duration::ZERO,
            outbox: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    /// Drain the actions accumulated since the last call.
    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, event: CoordinatorEvent) {
        self.outbox.push(Action::emit(self.address, event));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Subscriptions
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a new, unfunded subscription owned by `owner`.
    #[instrument(skip(self), fields(owner = %owner))]
    pub fn create_subscription(&mut self, owner: Address) -> SubscriptionId {
        let subscription_id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;

        self.subscriptions.insert(
            subscription_id,
            Subscription {
                owner,
                balance: Wei::ZERO,
                consumers: Vec::new(),
                fulfilled_count: 0,
            },
        );
        tracing::info!(subscription_id = %subscription_id, "Subscription created");

        self.emit(CoordinatorEvent::SubscriptionCreated {
            subscription_id,
            owner,
        });
        subscription_id
    }

    /// Recreate a subscription under a known id with an existing balance,
    /// as found on a forked network. Later ids continue after it.
    #[instrument(skip(self), fields(owner = %owner, balance = %balance))]
    pub fn restore_subscription(
        &mut self,
        subscription_id: SubscriptionId,
        owner: Address,
        balance: Wei,
    ) -> Result<(), VrfError> {
        if self.subscriptions.contains_key(&subscription_id) {
            return Err(VrfError::SubscriptionExists(subscription_id));
        }
        self.subscriptions.insert(
            subscription_id,
            Subscription {
                owner,
                balance,
                consumers: Vec::new(),
                fulfilled_count: 0,
            },
        );
        self.next_subscription_id = self.next_subscription_id.max(subscription_id.0 + 1);
        tracing::info!(subscription_id = %subscription_id, "Subscription restored");
        Ok(())
    }

    /// Add `amount` to a subscription's balance.
    #[instrument(skip(self), fields(subscription_id = %subscription_id, amount = %amount))]
    pub fn fund_subscription(
        &mut self,
        subscription_id: SubscriptionId,
        amount: Wei,
    ) -> Result<Wei, VrfError> {
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(VrfError::InvalidSubscription(subscription_id))?;

        let old_balance = subscription.balance;
        // Saturate rather than fail: funding is unbounded in the mock.
        let new_balance = Wei(old_balance.0.saturating_add(amount.0));
        subscription.balance = new_balance;

        self.emit(CoordinatorEvent::SubscriptionFunded {
            subscription_id,
            old_balance,
            new_balance,
        });
        Ok(new_balance)
    }

    /// Allow `consumer` to bill requests to the subscription.
    ///
    /// Adding an already registered consumer is a no-op.
    #[instrument(skip(self), fields(subscription_id = %subscription_id, consumer = %consumer))]
    pub fn add_consumer(
        &mut self,
        subscription_id: SubscriptionId,
        consumer: Address,
    ) -> Result<(), VrfError> {
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(VrfError::InvalidSubscription(subscription_id))?;

        if subscription.has_consumer(&consumer) {
            return Ok(());
        }
        if subscription.consumers.len() >= MAX_CONSUMERS {
            return Err(VrfError::TooManyConsumers(subscription_id));
        }
        subscription.consumers.push(consumer);
        tracing::debug!(consumers = subscription.consumers.len(), "Consumer added");

        self.emit(CoordinatorEvent::ConsumerAdded {
            subscription_id,
            consumer,
        });
        Ok(())
    }

    /// Revoke a consumer. Pending requests it already made stay valid.
    pub fn remove_consumer(
        &mut self,
        subscription_id: SubscriptionId,
        consumer: Address,
    ) -> Result<(), VrfError> {
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(VrfError::InvalidSubscription(subscription_id))?;

        let before = subscription.consumers.len();
        subscription.consumers.retain(|c| *c != consumer);
        if subscription.consumers.len() == before {
            return Err(VrfError::InvalidConsumer {
                subscription_id,
                consumer,
            });
        }

        self.emit(CoordinatorEvent::ConsumerRemoved {
            subscription_id,
            consumer,
        });
        Ok(())
    }

    pub fn subscription(&self, subscription_id: SubscriptionId) -> Option<&Subscription> {
        self.subscriptions.get(&subscription_id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Requests
    // ═══════════════════════════════════════════════════════════════════════

    /// Validate and record a randomness request from `consumer`.
    #[instrument(skip(self, request), fields(
        consumer = %consumer,
        subscription_id = %request.subscription_id,
        num_words = request.num_words
    ))]
    pub fn submit_request(
        &mut self,
        consumer: Address,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, VrfError> {
        let subscription = self
            .subscriptions
            .get(&request.subscription_id)
            .ok_or(VrfError::InvalidSubscription(request.subscription_id))?;

        if !subscription.has_consumer(&consumer) {
            return Err(VrfError::InvalidConsumer {
                subscription_id: request.subscription_id,
                consumer,
            });
        }

        let config = &self.config;
        if request.request_confirmations < config.min_request_confirmations
            || request.request_confirmations > config.max_request_confirmations
        {
            return Err(VrfError::InvalidRequestConfirmations {
                requested: request.request_confirmations,
                min: config.min_request_confirmations,
                max: config.max_request_confirmations,
            });
        }
        if request.callback_gas_limit > config.max_callback_gas_limit {
            return Err(VrfError::GasLimitTooBig {
                requested: request.callback_gas_limit,
                max: config.max_callback_gas_limit,
            });
        }
        if request.num_words == 0 || request.num_words > config.max_num_words {
            return Err(VrfError::InvalidNumWords {
                requested: request.num_words,
                max: config.max_num_words,
            });
        }

        let request_id = RequestId(self.next_request_id);
        self.next_request_id += 1;

        self.pending.insert(
            request_id,
            PendingRequest {
                request_id,
                consumer,
                request: request.clone(),
                requested_at: self.now,
            },
        );
        tracing::info!(request_id = %request_id, pending = self.pending.len(), "Randomness requested");

        self.emit(CoordinatorEvent::RandomWordsRequested {
            request_id,
            subscription_id: request.subscription_id,
            consumer,
            gas_lane: request.gas_lane,
            request_confirmations: request.request_confirmations,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
        });
        self.outbox.push(Action::DeliverRandomness {
            request_id,
            consumer,
        });
        Ok(request_id)
    }

    pub fn pending_request(&self, request_id: RequestId) -> Option<&PendingRequest> {
        self.pending.get(&request_id)
    }

    /// Number of requests awaiting fulfillment.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Deterministic words for a request: SHA-256 of the id and word index.
    pub fn derive_words(request_id: RequestId, num_words: u32) -> Vec<RandomWord> {
        (0..num_words)
            .map(|i| {
                RandomWord::from_hash(Hash::from_parts(&[
                    b"random-word",
                    &request_id.0.to_be_bytes(),
                    &i.to_be_bytes(),
                ]))
            })
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Fulfillment
    // ═══════════════════════════════════════════════════════════════════════

    /// Answer a pending request with derived words.
    ///
    /// See [`fulfill_random_words_with_override`](Self::fulfill_random_words_with_override).
    pub fn fulfill_random_words<T, E>(
        &mut self,
        request_id: RequestId,
        consumer: Address,
        callback: impl FnOnce(&Fulfillment) -> Result<T, E>,
    ) -> Result<(FulfillmentReceipt, Result<T, E>), VrfError> {
        self.fulfill_random_words_with_override(request_id, consumer, None, callback)
    }

    /// Answer a pending request and deliver the words to `callback`.
    ///
    /// Validation failures (unknown request, wrong consumer, wrong word
    /// count, unfunded subscription) leave the request pending. Once the
    /// callback has run the request is consumed and billed whether or not
    /// the consumer accepted the words; the callback's own result is
    /// returned alongside the receipt.
    #[instrument(skip(self, words, callback), fields(request_id = %request_id, consumer = %consumer))]
    pub fn fulfill_random_words_with_override<T, E>(
        &mut self,
        request_id: RequestId,
        consumer: Address,
        words: Option<Vec<RandomWord>>,
        callback: impl FnOnce(&Fulfillment) -> Result<T, E>,
    ) -> Result<(FulfillmentReceipt, Result<T, E>), VrfError> {
        let pending = self
            .pending
            .get(&request_id)
            .ok_or(VrfError::NonexistentRequest(request_id))?;

        if pending.consumer != consumer {
            return Err(VrfError::ConsumerMismatch {
                request_id,
                expected: pending.consumer,
                actual: consumer,
            });
        }

        let num_words = pending.request.num_words;
        let words = match words {
            Some(words) if words.len() != num_words as usize => {
                return Err(VrfError::InvalidRandomWords {
                    expected: num_words,
                    actual: words.len(),
                });
            }
            Some(words) => words,
            None => Self::derive_words(request_id, num_words),
        };

        let subscription_id = pending.request.subscription_id;
        let payment = self.config.base_fee;
        let subscription = self
            .subscriptions
            .get(&subscription_id)
            .ok_or(VrfError::InvalidSubscription(subscription_id))?;
        if subscription.balance < payment {
            return Err(VrfError::InsufficientBalance {
                subscription_id,
                balance: subscription.balance,
                required: payment,
            });
        }

        let fulfillment = Fulfillment {
            request_id,
            consumer,
            words,
        };
        let result = callback(&fulfillment);
        let success = result.is_ok();

        self.pending.remove(&request_id);
        if let Some(subscription) = self.subscriptions.get_mut(&subscription_id) {
            subscription.balance = subscription.balance.saturating_sub(payment);
            subscription.fulfilled_count += 1;
        }

        if success {
            tracing::info!(payment = %payment, "Randomness fulfilled");
        } else {
            tracing::warn!(payment = %payment, "Consumer rejected fulfillment");
        }

        self.emit(CoordinatorEvent::RandomWordsFulfilled {
            request_id,
            payment,
            success,
        });

        Ok((
            FulfillmentReceipt {
                request_id,
                payment,
                success,
            },
            result,
        ))
    }
}

impl RandomnessClient for VrfCoordinator {
    fn request_random_words(
        &mut self,
        consumer: Address,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, RequestRejected> {
        self.submit_request(consumer, request).map_err(Into::into)
    }
}
