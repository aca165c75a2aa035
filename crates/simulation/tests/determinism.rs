//! Tests for deterministic simulation.
//!
//! The same seed and the same calls must produce the same notifications,
//! receipts and winners, which is what makes a failing run replayable.

use lottery_core::{Event, EventRecord, RecordingSink};
use lottery_simulation::{KeeperConfig, OracleConfig, Receipt, SimulationConfig, SimulationRunner};
use lottery_state::LotteryConfig;
use lottery_types::test_utils::{test_address, test_addresses, test_entrance_fee, test_gas_lane};
use lottery_types::Wei;
use lottery_vrf::CoordinatorConfig;
use std::time::Duration;
use tracing_test::traced_test;

/// Run several rounds with staggered entries and return everything observed.
fn run_scenario(seed: u64) -> (Vec<EventRecord>, Vec<Receipt>) {
    let config = SimulationConfig::default()
        .with_keeper(KeeperConfig::enabled(Duration::from_secs(7)))
        .with_oracle(OracleConfig {
            jitter_fraction: 0.5,
            ..Default::default()
        });
    let mut runner = SimulationRunner::new(config, seed);
    let sink = RecordingSink::new();
    runner.add_sink(sink.clone());

    let deployer = test_address(0);
    let coordinator = runner.deploy_coordinator(deployer, CoordinatorConfig::default());
    let sub = runner.create_subscription(deployer).unwrap();
    runner.fund_subscription(sub, Wei::ONE_ETHER).unwrap();
    let lottery = runner
        .deploy_lottery(
            deployer,
            LotteryConfig::new(coordinator, test_entrance_fee(), Duration::from_secs(30))
                .with_gas_lane(test_gas_lane())
                .with_subscription_id(sub),
        )
        .unwrap();
    runner.add_consumer(sub, lottery).unwrap();

    let players = test_addresses(8);
    for (i, player) in players.iter().enumerate() {
        runner.fund_account(*player, Wei::ONE_ETHER).unwrap();
        runner.schedule(
            Duration::from_secs(i as u64 * 11),
            Event::EnterLottery {
                player: *player,
                value: test_entrance_fee(),
            },
        );
    }

    runner.run_until(Duration::from_secs(600));
    (sink.records(), runner.receipts().to_vec())
}

#[traced_test]
#[test]
fn test_same_seed_same_history() {
    let (events_a, receipts_a) = run_scenario(7);
    let (events_b, receipts_b) = run_scenario(7);

    assert!(!events_a.is_empty());
    assert_eq!(events_a, events_b);
    assert_eq!(receipts_a, receipts_b);
}

#[test]
fn test_seed_changes_fulfillment_timing() {
    let fulfilled_at = |seed| -> Vec<Duration> {
        run_scenario(seed)
            .0
            .into_iter()
            .filter(|r| r.event.name() == "WinnerPicked")
            .map(|r| r.timestamp)
            .collect()
    };

    let a = fulfilled_at(1);
    let b = fulfilled_at(2);
    assert!(!a.is_empty());
    assert_ne!(a, b);
}

#[test]
fn test_entries_while_calculating_are_reverted_not_lost() {
    let (events, receipts) = run_scenario(3);

    let entries = receipts.iter().filter(|r| r.call == "EnterLottery").count();
    let accepted = events
        .iter()
        .filter(|r| r.event.name() == "LotteryEnter")
        .count();
    let reverted = receipts
        .iter()
        .filter(|r| r.call == "EnterLottery" && !r.is_ok())
        .count();

    assert_eq!(entries, 8);
    assert_eq!(accepted + reverted, entries);
    for receipt in receipts.iter().filter(|r| r.call == "EnterLottery" && !r.is_ok()) {
        assert_eq!(receipt.reverted.as_deref(), Some("Lottery__LotteryNotOpen"));
    }
}
