//! The simulated chain: balances plus the deployed contracts.

use crate::{AccountLedger, ChainError};
use lottery_core::{Action, Event, Ledger, StateMachine, TimerId};
use lottery_state::{Lottery, LotteryConfig, UpkeepCheck};
use lottery_types::{Address, RandomWord, RequestId, Wei};
use lottery_vrf::{CoordinatorConfig, VrfCoordinator};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::instrument;

/// Automation keeper settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperConfig {
    /// Whether the keeper polls at all.
    pub enabled: bool,
    /// Time between `check_upkeep` polls.
    pub poll_interval: Duration,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl KeeperConfig {
    pub fn enabled(poll_interval: Duration) -> Self {
        Self {
            enabled: true,
            poll_interval,
        }
    }
}

/// Result of executing one call.
///
/// A reverted call publishes nothing, with one exception: when a
/// fulfillment's consumer callback fails, the coordinator still records the
/// consumed request, so its notification survives. Keeper polls re-arm
/// their timer either way.
#[derive(Debug)]
pub struct Execution {
    pub actions: Vec<Action>,
    pub result: Result<(), ChainError>,
}

/// Chain state machine.
///
/// Owns the account ledger, the mock coordinator and at most one lottery.
/// Calls run one at a time to completion; a rejected call restores the
/// ledger to its state before the call.
#[derive(Debug)]
pub struct ChainState {
    ledger: AccountLedger,

    coordinator: Option<VrfCoordinator>,

    lottery: Option<Lottery>,

    keeper: KeeperConfig,

    /// Contracts deployed per deployer, for address derivation.
    nonces: BTreeMap<Address, u64>,

    /// Current time.
    now: Duration,
}

impl ChainState {
    pub fn new(keeper: KeeperConfig) -> Self {
        Self {
            ledger: AccountLedger::new(),
            coordinator: None,
            lottery: None,
            keeper,
            nonces: BTreeMap::new(),
            now: Duration::ZERO,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut AccountLedger {
        &mut self.ledger
    }

    pub fn coordinator(&self) -> Option<&VrfCoordinator> {
        self.coordinator.as_ref()
    }

    /// Mutable coordinator access for subscription management. Actions it
    /// produces are collected by [`take_actions`](Self::take_actions).
    pub fn coordinator_mut(&mut self) -> Result<&mut VrfCoordinator, ChainError> {
        self.coordinator.as_mut().ok_or(ChainError::NoCoordinator)
    }

    pub fn lottery(&self) -> Option<&Lottery> {
        self.lottery.as_ref()
    }

    pub fn keeper(&self) -> &KeeperConfig {
        &self.keeper
    }

    /// Drain actions the coordinator produced outside of `execute`.
    pub fn take_actions(&mut self) -> Vec<Action> {
        self.coordinator
            .as_mut()
            .map(VrfCoordinator::take_actions)
            .unwrap_or_default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Deployment
    // ═══════════════════════════════════════════════════════════════════════

    fn next_contract_address(&mut self, deployer: Address) -> Address {
        let nonce = self.nonces.entry(deployer).or_insert(0);
        let address = Address::contract(&deployer, *nonce);
        *nonce += 1;
        address
    }

    /// Deploy a mock coordinator at an address derived from `deployer`.
    pub fn deploy_coordinator(&mut self, deployer: Address, config: CoordinatorConfig) -> Address {
        let address = self.next_contract_address(deployer);
        self.install_coordinator(address, config);
        address
    }

    /// Place a coordinator at a fixed address, replacing any existing one.
    pub fn install_coordinator(&mut self, address: Address, config: CoordinatorConfig) {
        let mut coordinator = VrfCoordinator::new(address, config);
        coordinator.set_time(self.now);
        self.coordinator = Some(coordinator);
        tracing::info!(address = %address, "Coordinator deployed");
    }

    /// Deploy the lottery. Its coordinator must already be deployed.
    ///
    /// Returns the timer that starts the keeper, when enabled.
    #[instrument(skip(self, config), fields(deployer = %deployer))]
    pub fn deploy_lottery(
        &mut self,
        deployer: Address,
        config: LotteryConfig,
    ) -> Result<(Address, Vec<Action>), ChainError> {
        if let Some(existing) = &self.lottery {
            return Err(ChainError::AlreadyDeployed(existing.address()));
        }
        match &self.coordinator {
            Some(c) if c.address() == config.vrf_coordinator => {}
            _ => return Err(ChainError::UnknownContract(config.vrf_coordinator)),
        }

        // Validate before consuming a nonce.
        config.validate()?;
        let address = self.next_contract_address(deployer);
        let lottery = Lottery::new(address, config, self.now)?;
        self.lottery = Some(lottery);

        let mut actions = Vec::new();
        if self.keeper.enabled {
            actions.push(Action::SetTimer {
                id: TimerId::Upkeep,
                duration: self.keeper.poll_interval,
            });
        }
        Ok((address, actions))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Calls
    // ═══════════════════════════════════════════════════════════════════════

    /// Read-only upkeep check.
    pub fn check_upkeep(&self, check_data: &[u8]) -> Result<UpkeepCheck, ChainError> {
        let lottery = self.lottery.as_ref().ok_or(ChainError::NoLottery)?;
        Ok(lottery.check_upkeep(check_data))
    }

    /// Execute one call to completion.
    pub fn execute(&mut self, event: Event) -> Execution {
        let checkpoint = self.ledger.clone();
        let mut actions = Vec::new();

        let result = match event {
            Event::UpkeepTimer => self.on_upkeep_timer(&mut actions),
            Event::EnterLottery { player, value } => self.on_enter(player, value, &mut actions),
            Event::PerformUpkeep { perform_data } => {
                self.on_perform_upkeep(&perform_data, &mut actions)
            }
            Event::FulfillRandomWords {
                request_id,
                consumer,
                words,
            } => self.on_fulfill(request_id, consumer, words, &mut actions),
        };

        if result.is_err() {
            self.ledger = checkpoint;
        }
        Execution { actions, result }
    }

    /// Payment moves to the lottery before it records the entry.
    fn on_enter(
        &mut self,
        player: Address,
        value: Wei,
        actions: &mut Vec<Action>,
    ) -> Result<(), ChainError> {
        let lottery = self.lottery.as_mut().ok_or(ChainError::NoLottery)?;
        self.ledger.transfer(player, lottery.address(), value)?;
        actions.extend(lottery.enter(player, value)?);
        Ok(())
    }

    fn on_perform_upkeep(
        &mut self,
        perform_data: &[u8],
        actions: &mut Vec<Action>,
    ) -> Result<(), ChainError> {
        let coordinator = self.coordinator.as_mut().ok_or(ChainError::NoCoordinator)?;
        let lottery = self.lottery.as_mut().ok_or(ChainError::NoLottery)?;

        let emitted = lottery.perform_upkeep(perform_data, coordinator)?;
        // Coordinator notifications precede the lottery's.
        actions.extend(coordinator.take_actions());
        actions.extend(emitted);
        Ok(())
    }

    /// Keeper poll: check, perform when due, then re-arm.
    fn on_upkeep_timer(&mut self, actions: &mut Vec<Action>) -> Result<(), ChainError> {
        if self.keeper.enabled {
            actions.push(Action::SetTimer {
                id: TimerId::Upkeep,
                duration: self.keeper.poll_interval,
            });
        }

        let check = self.check_upkeep(&[])?;
        if !check.upkeep_needed {
            tracing::trace!("Upkeep not needed");
            return Ok(());
        }
        tracing::debug!("Keeper performing upkeep");
        self.on_perform_upkeep(&check.perform_data, actions)
    }

    #[instrument(skip(self, words, actions), fields(request_id = %request_id, consumer = %consumer))]
    fn on_fulfill(
        &mut self,
        request_id: RequestId,
        consumer: Address,
        words: Option<Vec<RandomWord>>,
        actions: &mut Vec<Action>,
    ) -> Result<(), ChainError> {
        let coordinator = self.coordinator.as_mut().ok_or(ChainError::NoCoordinator)?;
        let lottery = &mut self.lottery;
        let ledger = &mut self.ledger;

        let (receipt, delivered) = coordinator.fulfill_random_words_with_override(
            request_id,
            consumer,
            words,
            |fulfillment| {
                let target = lottery
                    .as_mut()
                    .filter(|l| l.address() == fulfillment.consumer)
                    .ok_or(ChainError::UnknownContract(fulfillment.consumer))?;
                target
                    .fulfill_random_words(fulfillment.request_id, &fulfillment.words, ledger)
                    .map_err(ChainError::from)
            },
        )?;

        match delivered {
            Ok(emitted) => {
                actions.extend(emitted);
                actions.extend(coordinator.take_actions());
                Ok(())
            }
            Err(err) => {
                tracing::warn!(payment = %receipt.payment, error = %err, "Consumer callback reverted");
                actions.extend(coordinator.take_actions());
                Err(err)
            }
        }
    }
}

impl StateMachine for ChainState {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        let call = event.type_name();
        let Execution {
            mut actions,
            result,
        } = self.execute(event);
        if let Err(err) = result {
            actions.push(Action::CallReverted {
                call,
                reason: err.to_string(),
            });
        }
        actions
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
        if let Some(coordinator) = self.coordinator.as_mut() {
            coordinator.set_time(now);
        }
        if let Some(lottery) = self.lottery.as_mut() {
            lottery.set_time(now);
        }
    }

    fn now(&self) -> Duration {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_core::{LogEvent, LotteryEvent};
    use lottery_types::test_utils::{test_address, test_entrance_fee, test_gas_lane};
    use lottery_types::{SubscriptionId, Wei};

    const INTERVAL: Duration = Duration::from_secs(30);

    /// Chain with a funded subscription and a lottery registered on it.
    fn deployed_chain(keeper: KeeperConfig) -> (ChainState, Address) {
        let deployer = test_address(0);
        let mut chain = ChainState::new(keeper);
        let coordinator = chain.deploy_coordinator(deployer, CoordinatorConfig::default());
        let sub = chain.coordinator_mut().unwrap().create_subscription(deployer);
        chain
            .coordinator_mut()
            .unwrap()
            .fund_subscription(sub, Wei::ONE_ETHER)
            .unwrap();

        let config = LotteryConfig::new(coordinator, test_entrance_fee(), INTERVAL)
            .with_gas_lane(test_gas_lane())
            .with_subscription_id(sub);
        let (lottery, _) = chain.deploy_lottery(deployer, config).unwrap();
        chain
            .coordinator_mut()
            .unwrap()
            .add_consumer(sub, lottery)
            .unwrap();
        chain.take_actions();
        (chain, lottery)
    }

    fn enter(chain: &mut ChainState, seed: u8) -> Address {
        let player = test_address(seed);
        chain.ledger_mut().mint(player, Wei::ONE_ETHER).unwrap();
        let execution = chain.execute(Event::EnterLottery {
            player,
            value: test_entrance_fee(),
        });
        execution.result.unwrap();
        player
    }

    #[test]
    fn test_deploy_requires_coordinator() {
        let mut chain = ChainState::new(KeeperConfig::default());
        let config = LotteryConfig::new(test_address(9), test_entrance_fee(), INTERVAL);
        assert_eq!(
            chain.deploy_lottery(test_address(0), config).unwrap_err(),
            ChainError::UnknownContract(test_address(9))
        );
    }

    #[test]
    fn test_second_lottery_rejected() {
        let (mut chain, lottery) = deployed_chain(KeeperConfig::default());
        let coordinator = chain.coordinator().unwrap().address();
        let config = LotteryConfig::new(coordinator, test_entrance_fee(), INTERVAL);
        assert_eq!(
            chain.deploy_lottery(test_address(0), config).unwrap_err(),
            ChainError::AlreadyDeployed(lottery)
        );
    }

    #[test]
    fn test_reverted_entry_refunds_player() {
        let (mut chain, lottery) = deployed_chain(KeeperConfig::default());
        let player = test_address(1);
        chain.ledger_mut().mint(player, Wei::ONE_ETHER).unwrap();

        let execution = chain.execute(Event::EnterLottery {
            player,
            value: Wei(1),
        });

        assert!(matches!(
            execution.result,
            Err(ChainError::Lottery(lottery_state::LotteryError::SendMoreToEnterLottery { .. }))
        ));
        assert!(execution.actions.is_empty());
        assert_eq!(chain.ledger().balance_of(&player), Wei::ONE_ETHER);
        assert!(chain.ledger().balance_of(&lottery).is_zero());
    }

    #[test]
    fn test_entry_without_funds_reverts() {
        let (mut chain, _) = deployed_chain(KeeperConfig::default());
        let execution = chain.execute(Event::EnterLottery {
            player: test_address(1),
            value: test_entrance_fee(),
        });
        assert!(matches!(execution.result, Err(ChainError::Transfer(_))));
        assert_eq!(chain.lottery().unwrap().number_of_players(), 0);
    }

    #[test]
    fn test_perform_upkeep_orders_coordinator_event_first() {
        let (mut chain, lottery) = deployed_chain(KeeperConfig::default());
        enter(&mut chain, 1);
        chain.set_time(INTERVAL);

        let execution = chain.execute(Event::PerformUpkeep {
            perform_data: Vec::new(),
        });
        execution.result.unwrap();

        let emitted: Vec<&LogEvent> = execution
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Emit { event, .. } => Some(event),
                _ => None,
            })
            .collect();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].name(), "RandomWordsRequested");
        assert_eq!(
            emitted[1].as_lottery(),
            Some(&LotteryEvent::RequestedLotteryWinner {
                request_id: RequestId(1)
            })
        );
        assert!(execution.actions.contains(&Action::DeliverRandomness {
            request_id: RequestId(1),
            consumer: lottery,
        }));
    }

    #[test]
    fn test_transfer_failure_reverts_lottery_but_consumes_request() {
        let (mut chain, lottery) = deployed_chain(KeeperConfig::default());
        let player = enter(&mut chain, 1);
        chain.set_time(INTERVAL);
        chain
            .execute(Event::PerformUpkeep {
                perform_data: Vec::new(),
            })
            .result
            .unwrap();
        chain.ledger_mut().set_reachable(player, false);

        let execution = chain.execute(Event::FulfillRandomWords {
            request_id: RequestId(1),
            consumer: lottery,
            words: None,
        });

        assert!(matches!(
            execution.result,
            Err(ChainError::Lottery(lottery_state::LotteryError::TransferFailed { .. }))
        ));
        assert!(matches!(
            execution.actions.as_slice(),
            [Action::Emit { event, .. }] if event.name() == "RandomWordsFulfilled"
        ));
        let state = chain.lottery().unwrap();
        assert_eq!(state.number_of_players(), 1);
        assert!(state.pending_request().is_some());
        assert_eq!(chain.ledger().balance_of(&lottery), test_entrance_fee());
        assert_eq!(chain.coordinator().unwrap().pending_count(), 0);
        assert_eq!(
            chain.coordinator().unwrap().subscription(SubscriptionId(1)).unwrap().fulfilled_count,
            1
        );
    }

    #[test]
    fn test_keeper_tick_rearms_and_performs() {
        let (mut chain, _) = deployed_chain(KeeperConfig::enabled(Duration::from_secs(5)));

        let actions = chain.handle(Event::UpkeepTimer);
        assert_eq!(
            actions,
            vec![Action::SetTimer {
                id: TimerId::Upkeep,
                duration: Duration::from_secs(5)
            }]
        );

        enter(&mut chain, 1);
        chain.set_time(INTERVAL);
        let actions = chain.handle(Event::UpkeepTimer);
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::DeliverRandomness { .. })));
        assert!(!chain.lottery().unwrap().lottery_state().is_open());
    }

    #[test]
    fn test_handle_reports_reverted_call() {
        let (mut chain, _) = deployed_chain(KeeperConfig::default());
        let actions = chain.handle(Event::PerformUpkeep {
            perform_data: Vec::new(),
        });
        assert!(matches!(
            actions.as_slice(),
            [Action::CallReverted { call: "PerformUpkeep", reason }]
                if reason.starts_with("Lottery__UpkeepNotNeeded")
        ));
    }
}
