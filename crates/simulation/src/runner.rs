//! Deterministic simulation runner.
//!
//! The runner owns the clock and a single [`ChainState`]. Calls are either
//! submitted synchronously (they run immediately at the current time) or
//! scheduled on the event queue, which `run_until` drains in
//! (time, priority, sequence) order.

use crate::chain::{ChainState, Execution, KeeperConfig};
use crate::event_queue::EventKey;
use crate::ChainError;
use lottery_core::{Action, Event, EventRecord, EventSink, Ledger, StateMachine, TimerId};
use lottery_state::{Lottery, LotteryConfig, UpkeepCheck};
use lottery_types::{Address, RandomWord, RequestId, SubscriptionId, Wei};
use lottery_vrf::{CoordinatorConfig, VrfCoordinator};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// How the simulated oracle answers requests.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Schedule a fulfillment for every accepted request. When off, tests
    /// fulfill by hand.
    pub auto_fulfill: bool,
    /// Base delay between request and fulfillment.
    pub fulfillment_latency: Duration,
    /// Jitter as a fraction of the base latency (0.0 - 1.0).
    pub jitter_fraction: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            auto_fulfill: true,
            // Three confirmations at a 12s block time.
            fulfillment_latency: Duration::from_secs(36),
            jitter_fraction: 0.1,
        }
    }
}

impl OracleConfig {
    /// Oracle that never answers on its own.
    pub fn manual() -> Self {
        Self {
            auto_fulfill: false,
            ..Default::default()
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    pub oracle: OracleConfig,
    pub keeper: KeeperConfig,
}

impl SimulationConfig {
    pub fn with_oracle(mut self, oracle: OracleConfig) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_keeper(mut self, keeper: KeeperConfig) -> Self {
        self.keeper = keeper;
        self
    }
}

/// Outcome of one processed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub at: Duration,
    pub call: &'static str,
    /// Revert reason, if the call was reverted.
    pub reverted: Option<String>,
}

impl Receipt {
    pub fn is_ok(&self) -> bool {
        self.reverted.is_none()
    }
}

/// Statistics collected during simulation.
#[derive(Debug, Default, Clone)]
pub struct SimulationStats {
    /// Calls executed, queued or synchronous.
    pub calls_executed: u64,
    /// Queued events processed by priority.
    pub events_by_priority: [u64; 4],
    /// Total actions generated.
    pub actions_generated: u64,
    /// Notifications delivered to sinks.
    pub notifications_published: u64,
    /// Calls that were reverted.
    pub calls_reverted: u64,
    /// Fulfillments scheduled by the oracle.
    pub fulfillments_scheduled: u64,
    /// Timers set.
    pub timers_set: u64,
    /// Timers cancelled.
    pub timers_cancelled: u64,
}

/// Deterministic simulation runner.
///
/// Given the same seed and the same sequence of calls, produces identical
/// notifications and receipts every run.
pub struct SimulationRunner {
    chain: ChainState,

    /// Global event queue, ordered deterministically.
    event_queue: BTreeMap<EventKey, Event>,

    /// Sequence counter for deterministic ordering.
    sequence: u64,

    /// Current simulation time.
    now: Duration,

    /// RNG for oracle latency jitter (seeded for determinism).
    rng: ChaCha8Rng,

    oracle: OracleConfig,

    /// Timer registry for cancellation support.
    timers: HashMap<TimerId, EventKey>,

    sinks: Vec<Box<dyn EventSink>>,

    receipts: Vec<Receipt>,

    stats: SimulationStats,
}

impl SimulationRunner {
    /// Create a new simulation runner with the given configuration.
    pub fn new(config: SimulationConfig, seed: u64) -> Self {
        info!(
            seed,
            auto_fulfill = config.oracle.auto_fulfill,
            keeper = config.keeper.enabled,
            "Created simulation runner"
        );
        Self {
            chain: ChainState::new(config.keeper),
            event_queue: BTreeMap::new(),
            sequence: 0,
            now: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(seed),
            oracle: config.oracle,
            timers: HashMap::new(),
            sinks: Vec::new(),
            receipts: Vec::new(),
            stats: SimulationStats::default(),
        }
    }

    /// Register an observer for emitted notifications.
    pub fn add_sink(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    pub fn coordinator(&self) -> Option<&VrfCoordinator> {
        self.chain.coordinator()
    }

    pub fn lottery(&self) -> Option<&Lottery> {
        self.chain.lottery()
    }

    /// Number of events waiting in the queue.
    pub fn queued_events(&self) -> usize {
        self.event_queue.len()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accounts
    // ═══════════════════════════════════════════════════════════════════════

    /// Give `account` funds out of thin air.
    pub fn fund_account(&mut self, account: Address, amount: Wei) -> Result<Wei, ChainError> {
        Ok(self.chain.ledger_mut().mint(account, amount)?)
    }

    pub fn balance_of(&self, account: &Address) -> Wei {
        self.chain.ledger().balance_of(account)
    }

    /// Make `account` refuse (or accept again) incoming transfers.
    pub fn set_reachable(&mut self, account: Address, reachable: bool) {
        self.chain.ledger_mut().set_reachable(account, reachable);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Deployment
    // ═══════════════════════════════════════════════════════════════════════

    pub fn deploy_coordinator(&mut self, deployer: Address, config: CoordinatorConfig) -> Address {
        self.chain.set_time(self.now);
        self.chain.deploy_coordinator(deployer, config)
    }

    /// Place a coordinator at a known address, as on a forked network.
    pub fn install_coordinator(&mut self, address: Address, config: CoordinatorConfig) {
        self.chain.set_time(self.now);
        self.chain.install_coordinator(address, config);
    }

    pub fn create_subscription(&mut self, owner: Address) -> Result<SubscriptionId, ChainError> {
        let subscription_id = self.chain.coordinator_mut()?.create_subscription(owner);
        self.flush_coordinator();
        Ok(subscription_id)
    }

    /// Recreate an existing subscription on a forked coordinator.
    pub fn restore_subscription(
        &mut self,
        subscription_id: SubscriptionId,
        owner: Address,
        balance: Wei,
    ) -> Result<(), ChainError> {
        self.chain
            .coordinator_mut()?
            .restore_subscription(subscription_id, owner, balance)?;
        Ok(())
    }

    pub fn fund_subscription(
        &mut self,
        subscription_id: SubscriptionId,
        amount: Wei,
    ) -> Result<Wei, ChainError> {
        let balance = self
            .chain
            .coordinator_mut()?
            .fund_subscription(subscription_id, amount)?;
        self.flush_coordinator();
        Ok(balance)
    }

    pub fn add_consumer(
        &mut self,
        subscription_id: SubscriptionId,
        consumer: Address,
    ) -> Result<(), ChainError> {
        self.chain
            .coordinator_mut()?
            .add_consumer(subscription_id, consumer)?;
        self.flush_coordinator();
        Ok(())
    }

    /// Deploy the lottery and, if the keeper is enabled, start polling.
    pub fn deploy_lottery(
        &mut self,
        deployer: Address,
        config: LotteryConfig,
    ) -> Result<Address, ChainError> {
        self.chain.set_time(self.now);
        let (address, actions) = self.chain.deploy_lottery(deployer, config)?;
        for action in actions {
            self.process_action(action);
        }
        Ok(address)
    }

    fn flush_coordinator(&mut self) {
        let actions = self.chain.take_actions();
        for action in actions {
            self.process_action(action);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Synchronous calls
    // ═══════════════════════════════════════════════════════════════════════

    /// Enter the lottery, paying `value` from the player's balance.
    pub fn enter_lottery(&mut self, player: Address, value: Wei) -> Result<(), ChainError> {
        self.submit(Event::EnterLottery { player, value })
    }

    pub fn check_upkeep(&mut self) -> Result<UpkeepCheck, ChainError> {
        self.chain.set_time(self.now);
        self.chain.check_upkeep(&[])
    }

    /// Perform upkeep and return the id of the submitted request.
    pub fn perform_upkeep(&mut self) -> Result<RequestId, ChainError> {
        self.submit(Event::PerformUpkeep {
            perform_data: Vec::new(),
        })?;
        self.chain
            .lottery()
            .and_then(|l| l.pending_request())
            .map(|p| p.request_id)
            .ok_or(ChainError::NoLottery)
    }

    /// Have the coordinator answer `request_id` with derived words.
    pub fn fulfill_random_words(
        &mut self,
        request_id: RequestId,
        consumer: Address,
    ) -> Result<(), ChainError> {
        self.submit(Event::FulfillRandomWords {
            request_id,
            consumer,
            words: None,
        })
    }

    /// Have the coordinator answer `request_id` with the given words.
    pub fn fulfill_random_words_with_override(
        &mut self,
        request_id: RequestId,
        consumer: Address,
        words: Vec<RandomWord>,
    ) -> Result<(), ChainError> {
        self.submit(Event::FulfillRandomWords {
            request_id,
            consumer,
            words: Some(words),
        })
    }

    fn submit(&mut self, event: Event) -> Result<(), ChainError> {
        let call = event.type_name();
        self.chain.set_time(self.now);
        let Execution { actions, result } = self.chain.execute(event);

        self.stats.calls_executed += 1;
        self.record(call, result.as_ref().err().map(ToString::to_string));
        for action in actions {
            self.process_action(action);
        }
        result
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Time and scheduling
    // ═══════════════════════════════════════════════════════════════════════

    /// Move the clock forward by `duration`, processing anything that
    /// comes due on the way.
    pub fn advance_time(&mut self, duration: Duration) {
        let target = self.now + duration;
        self.run_until(target);
    }

    /// Schedule a call `delay` from now.
    pub fn schedule(&mut self, delay: Duration, event: Event) -> EventKey {
        let time = self.now + delay;
        self.schedule_event(time, event)
    }

    /// Process queued events up to and including `end_time`, then set the
    /// clock to `end_time`.
    pub fn run_until(&mut self, end_time: Duration) {
        trace!(
            end_time_secs = end_time.as_secs_f64(),
            "Running simulation step"
        );

        while let Some((&key, _)) = self.event_queue.first_key_value() {
            if key.time > end_time {
                debug!(
                    remaining_events = self.event_queue.len(),
                    "Time limit reached"
                );
                break;
            }

            let Some((key, event)) = self.event_queue.pop_first() else {
                break;
            };
            self.now = key.time;
            if matches!(event, Event::UpkeepTimer) {
                self.timers.remove(&TimerId::Upkeep);
            }

            trace!(time = ?self.now, event = event.type_name(), "Processing event");

            self.stats.calls_executed += 1;
            self.stats.events_by_priority[event.priority() as usize] += 1;

            let call = event.type_name();
            self.chain.set_time(self.now);
            let actions = self.chain.handle(event);

            let reverted = actions.iter().find_map(|a| match a {
                Action::CallReverted { reason, .. } => Some(reason.clone()),
                _ => None,
            });
            self.record(call, reverted);

            for action in actions {
                self.process_action(action);
            }
        }

        self.now = self.now.max(end_time);
        self.chain.set_time(self.now);
    }

    fn record(&mut self, call: &'static str, reverted: Option<String>) {
        self.receipts.push(Receipt {
            at: self.now,
            call,
            reverted,
        });
    }

    /// Process an action from the chain.
    fn process_action(&mut self, action: Action) {
        self.stats.actions_generated += 1;
        match action {
            Action::Emit { emitter, event } => {
                let record = EventRecord {
                    emitter,
                    timestamp: self.now,
                    event,
                };
                for sink in &mut self.sinks {
                    sink.publish(&record);
                }
                self.stats.notifications_published += 1;
            }

            Action::SetTimer { id, duration } => {
                if let Some(old) = self.timers.remove(&id) {
                    self.event_queue.remove(&old);
                }
                let fire_time = self.now + duration;
                let key = self.schedule_event(fire_time, self.timer_to_event(id));
                self.timers.insert(id, key);
                self.stats.timers_set += 1;
            }

            Action::CancelTimer { id } => {
                if let Some(key) = self.timers.remove(&id) {
                    self.event_queue.remove(&key);
                    self.stats.timers_cancelled += 1;
                }
            }

            Action::DeliverRandomness {
                request_id,
                consumer,
            } => {
                if !self.oracle.auto_fulfill {
                    trace!(request_id = %request_id, "Awaiting manual fulfillment");
                    return;
                }
                let latency = self.sample_latency();
                self.schedule_event(
                    self.now + latency,
                    Event::FulfillRandomWords {
                        request_id,
                        consumer,
                        words: None,
                    },
                );
                self.stats.fulfillments_scheduled += 1;
                debug!(request_id = %request_id, latency = ?latency, "Fulfillment scheduled");
            }

            Action::CallReverted { call, reason } => {
                self.stats.calls_reverted += 1;
                warn!(call, reason = %reason, "Call reverted");
            }
        }
    }

    /// Sample oracle latency with jitter.
    fn sample_latency(&mut self) -> Duration {
        let base = self.oracle.fulfillment_latency.as_secs_f64();
        let jitter_range = base * self.oracle.jitter_fraction.clamp(0.0, 1.0);
        let jitter = if jitter_range > 0.0 {
            self.rng.gen_range(-jitter_range..jitter_range)
        } else {
            0.0
        };
        Duration::from_secs_f64((base + jitter).max(0.001))
    }

    /// Schedule an event.
    fn schedule_event(&mut self, time: Duration, event: Event) -> EventKey {
        self.sequence += 1;
        let key = EventKey::new(time, &event, self.sequence);
        self.event_queue.insert(key, event);
        key
    }

    /// Convert a timer ID to an event.
    fn timer_to_event(&self, id: TimerId) -> Event {
        match id {
            TimerId::Upkeep => Event::UpkeepTimer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_is_seed_deterministic() {
        let mut a = SimulationRunner::new(SimulationConfig::default(), 42);
        let mut b = SimulationRunner::new(SimulationConfig::default(), 42);
        for _ in 0..10 {
            assert_eq!(a.sample_latency(), b.sample_latency());
        }
    }

    #[test]
    fn test_latency_without_jitter() {
        let oracle = OracleConfig {
            jitter_fraction: 0.0,
            fulfillment_latency: Duration::from_secs(5),
            ..Default::default()
        };
        let mut runner = SimulationRunner::new(SimulationConfig::default().with_oracle(oracle), 1);
        assert_eq!(runner.sample_latency(), Duration::from_secs(5));
    }

    #[test]
    fn test_run_until_advances_clock() {
        let mut runner = SimulationRunner::new(SimulationConfig::default(), 1);
        runner.run_until(Duration::from_secs(10));
        assert_eq!(runner.now(), Duration::from_secs(10));
        runner.advance_time(Duration::from_secs(5));
        assert_eq!(runner.now(), Duration::from_secs(15));
    }
}
