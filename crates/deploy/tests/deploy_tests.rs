//! Deploy-then-play tests across the deploy, export and simulation layers.

use lottery_core::{LotteryEvent, RecordingSink};
use lottery_deploy::{
    deploy_lottery, DeployError, FrontEndExporter, NetworkTable, FUND_AMOUNT,
};
use lottery_simulation::{OracleConfig, SimulationConfig, SimulationRunner};
use lottery_types::test_utils::{test_address, test_addresses};
use lottery_types::{Address, ChainId, LotteryState, RandomWord, Wei};
use lottery_vrf::{CoordinatorConfig, DEFAULT_BASE_FEE};
use std::fs;
use std::time::Duration;
use tracing_test::traced_test;

fn manual_runner() -> SimulationRunner {
    SimulationRunner::new(
        SimulationConfig::default().with_oracle(OracleConfig::manual()),
        7,
    )
}

#[traced_test]
#[test]
fn test_development_deploy_and_round() {
    let mut runner = manual_runner();
    let sink = RecordingSink::new();
    runner.add_sink(sink.clone());
    let table = NetworkTable::builtin();

    let deployment = deploy_lottery(&mut runner, "hardhat", &table, test_address(0)).unwrap();
    let fee = deployment.args.entrance_fee;
    assert_eq!(fee, Wei::parse_ether("0.1").unwrap());
    assert_eq!(deployment.args.interval, Duration::from_secs(30));

    let players = test_addresses(4)[1..].to_vec();
    for player in &players {
        runner.fund_account(*player, Wei::ONE_ETHER).unwrap();
        runner.enter_lottery(*player, fee).unwrap();
    }
    runner.advance_time(deployment.args.interval + Duration::from_secs(1));
    let request_id = runner.perform_upkeep().unwrap();
    runner
        .fulfill_random_words_with_override(
            request_id,
            deployment.address,
            vec![RandomWord::from_u64(2)],
        )
        .unwrap();

    let lottery = runner.lottery().unwrap();
    assert_eq!(lottery.recent_winner(), Some(players[2]));
    assert_eq!(lottery.lottery_state(), LotteryState::Open);
    assert_eq!(
        sink.lottery_events().last(),
        Some(&LotteryEvent::WinnerPicked { winner: players[2] })
    );

    let subscription = runner
        .coordinator()
        .unwrap()
        .subscription(deployment.args.subscription_id)
        .unwrap();
    assert_eq!(subscription.balance, FUND_AMOUNT.saturating_sub(DEFAULT_BASE_FEE));
}

#[test]
fn test_live_deploy_against_forked_coordinator() {
    let table = NetworkTable::builtin();
    let sepolia = table.get(ChainId::SEPOLIA).unwrap();
    let coordinator = sepolia.vrf_coordinator.unwrap();
    let subscription_id = sepolia.subscription_id.unwrap();
    let owner = test_address(0);

    let mut runner = manual_runner();
    runner.install_coordinator(
        coordinator,
        CoordinatorConfig::default().with_max_callback_gas_limit(5_000_000),
    );
    runner
        .restore_subscription(subscription_id, owner, FUND_AMOUNT)
        .unwrap();
    let deployment = deploy_lottery(&mut runner, "sepolia", &table, owner).unwrap();

    assert_eq!(deployment.confirmations, 6);
    assert_eq!(deployment.args.vrf_coordinator, coordinator);
    assert_eq!(deployment.args.subscription_id, subscription_id);
    // Live deploys leave consumer registration to the subscription owner.
    assert!(!runner
        .coordinator()
        .unwrap()
        .subscription(subscription_id)
        .unwrap()
        .has_consumer(&deployment.address));

    runner.add_consumer(subscription_id, deployment.address).unwrap();
    let player = test_address(1);
    runner.fund_account(player, Wei::ONE_ETHER).unwrap();
    runner
        .enter_lottery(player, deployment.args.entrance_fee)
        .unwrap();
    runner.advance_time(deployment.args.interval + Duration::from_secs(1));
    let request_id = runner.perform_upkeep().unwrap();
    runner
        .fulfill_random_words(request_id, deployment.address)
        .unwrap();
    assert_eq!(runner.lottery().unwrap().recent_winner(), Some(player));
}

#[test]
fn test_live_deploy_fails_before_upkeep_when_subscription_missing() {
    let table = NetworkTable::builtin();
    let coordinator = table.get(ChainId::SEPOLIA).unwrap().vrf_coordinator.unwrap();

    let mut runner = manual_runner();
    runner.install_coordinator(coordinator, CoordinatorConfig::default());
    let err = deploy_lottery(&mut runner, "sepolia", &table, test_address(0)).unwrap_err();

    assert!(matches!(err, DeployError::UnknownSubscription { .. }));
    assert!(runner.lottery().is_none());
}

#[test]
fn test_live_deploy_with_wrong_coordinator_fails() {
    let mut runner = manual_runner();
    runner.install_coordinator(Address::ZERO, CoordinatorConfig::default());

    let err = deploy_lottery(&mut runner, "sepolia", &NetworkTable::builtin(), test_address(0))
        .unwrap_err();
    assert!(matches!(err, DeployError::Chain(_)));
    assert!(runner.lottery().is_none());
}

#[test]
fn test_override_file_with_missing_fields_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("networks.toml");
    fs::write(
        &path,
        r#"
[networks.80001]
name = "mumbai"
vrf_coordinator = "0x7a1BaC17Ccc5b313516C5E16fb24f7659aA5ebed"
entrance_fee = "0.01"
interval_secs = 60
"#,
    )
    .unwrap();

    let mut table = NetworkTable::builtin();
    table.merge_file(&path).unwrap();

    let err = deploy_lottery(&mut manual_runner(), "mumbai", &table, test_address(0)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "network config for chain 80001 is missing 'gas_lane'"
    );
}

#[test]
fn test_override_changes_development_fee() {
    let mut table = NetworkTable::builtin();
    table
        .merge_toml("[networks.31337]\nentrance_fee = \"0.5\"\n")
        .unwrap();

    let deployment =
        deploy_lottery(&mut manual_runner(), "localhost", &table, test_address(0)).unwrap();
    assert_eq!(deployment.args.entrance_fee, Wei::parse_ether("0.5").unwrap());
}

#[test]
fn test_export_after_deploy() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = FrontEndExporter::in_dir(dir.path());
    let table = NetworkTable::builtin();

    let mut runner = manual_runner();
    let first = deploy_lottery(&mut runner, "hardhat", &table, test_address(0)).unwrap();
    exporter.export(&first).unwrap();
    exporter.export(&first).unwrap();

    let mut other = manual_runner();
    let second = deploy_lottery(&mut other, "hardhat", &table, test_address(1)).unwrap();
    exporter.export(&second).unwrap();

    let addresses = exporter.read_contract_addresses().unwrap();
    assert_eq!(
        addresses["31337"],
        vec![first.address.to_string(), second.address.to_string()]
    );
    assert!(exporter.abi_path().exists());
}
