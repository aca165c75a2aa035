//! Lottery deployment.
//!
//! On development chains the deployer provisions everything itself: a mock
//! coordinator (reused if one exists), a subscription funded with
//! [`FUND_AMOUNT`], the lottery, and finally the consumer registration.
//! On live chains the coordinator and subscription come from the network
//! table and must already exist.

use crate::networks::{block_confirmations, require, NetworkTable};
use crate::DeployError;
use lottery_simulation::{ChainError, SimulationRunner};
use lottery_state::LotteryConfig;
use lottery_types::{Address, ChainId, SubscriptionId, Wei};
use lottery_vrf::CoordinatorConfig;
use serde::Serialize;
use tracing::instrument;

/// Amount a development subscription is funded with: 2 units.
pub const FUND_AMOUNT: Wei = Wei(2_000_000_000_000_000_000);

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    pub address: Address,
    pub chain_id: ChainId,
    pub network: String,
    /// Constructor arguments the lottery was deployed with.
    pub args: LotteryConfig,
    /// Confirmations a real deploy would wait for.
    pub confirmations: u32,
}

/// Deploy the lottery to `network`, resolving parameters from `table`.
#[instrument(skip(runner, table), fields(deployer = %deployer))]
pub fn deploy_lottery(
    runner: &mut SimulationRunner,
    network: &str,
    table: &NetworkTable,
    deployer: Address,
) -> Result<Deployment, DeployError> {
    let (chain_id, config) = table.resolve(network)?;
    let development = config.is_development();

    let entrance_fee = require(config.entrance_fee, chain_id, "entrance_fee")?;
    let gas_lane = require(config.gas_lane, chain_id, "gas_lane")?;
    let callback_gas_limit = require(config.callback_gas_limit, chain_id, "callback_gas_limit")?;
    let interval = require(config.interval, chain_id, "interval")?;

    let (coordinator, subscription_id) = if development {
        let coordinator = match runner.coordinator() {
            Some(existing) => existing.address(),
            None => {
                let address = runner.deploy_coordinator(deployer, CoordinatorConfig::default());
                tracing::info!(coordinator = %address, "Deployed mock coordinator");
                address
            }
        };
        let subscription_id = runner.create_subscription(deployer)?;
        runner.fund_subscription(subscription_id, FUND_AMOUNT)?;
        tracing::info!(
            subscription = %subscription_id,
            amount = %FUND_AMOUNT.format_ether(),
            "Created and funded subscription"
        );
        (coordinator, subscription_id)
    } else {
        let coordinator = require(config.vrf_coordinator, chain_id, "vrf_coordinator")?;
        let subscription_id = require(config.subscription_id, chain_id, "subscription_id")?;
        check_live_coordinator(runner, chain_id, coordinator, subscription_id)?;
        (coordinator, subscription_id)
    };

    let args = LotteryConfig::new(coordinator, entrance_fee, interval)
        .with_gas_lane(gas_lane)
        .with_subscription_id(subscription_id)
        .with_callback_gas_limit(callback_gas_limit);

    let address = runner.deploy_lottery(deployer, args.clone())?;

    if development {
        runner.add_consumer(subscription_id, address)?;
        tracing::debug!(consumer = %address, "Lottery registered as consumer");
    }

    let deployment = Deployment {
        address,
        chain_id,
        network: network.to_string(),
        args,
        confirmations: block_confirmations(network),
    };
    tracing::info!(
        network,
        chain = %chain_id,
        lottery = %address,
        confirmations = deployment.confirmations,
        "Lottery deployed"
    );
    Ok(deployment)
}

/// The configured coordinator must be the one on chain and must know the
/// configured subscription.
fn check_live_coordinator(
    runner: &SimulationRunner,
    chain: ChainId,
    coordinator: Address,
    subscription_id: SubscriptionId,
) -> Result<(), DeployError> {
    let existing = runner.coordinator().ok_or(ChainError::NoCoordinator)?;
    if existing.address() != coordinator {
        return Err(ChainError::UnknownContract(coordinator).into());
    }
    if existing.subscription(subscription_id).is_none() {
        return Err(DeployError::UnknownSubscription {
            chain,
            subscription_id,
        });
    }
    Ok(())
}
