//! Lottery CLI
//!
//! Deploys the lottery to a simulated chain, optionally exporting the
//! front-end artifacts, and runs complete rounds.
//!
//! # Example
//!
//! ```bash
//! # Deploy to the development chain and update the front-end
//! lottery deploy --network hardhat --update-front-end --front-end-dir ../lottery-front-end
//!
//! # Deploy against a forked sepolia coordinator with custom parameters
//! lottery deploy --network sepolia --networks networks.toml
//!
//! # Print the upkeep timing values
//! lottery console
//!
//! # Play one round with 5 players and a fixed random word
//! lottery simulate --players 5 --word 7
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lottery_deploy::{deploy_lottery, Deployment, FrontEndExporter, NetworkTable, FUND_AMOUNT};
use lottery_simulation::{OracleConfig, SimulationConfig, SimulationRunner};
use lottery_types::{Address, Hash, RandomWord, Wei};
use lottery_vrf::CoordinatorConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Lottery deployment and simulation tool
#[derive(Parser, Debug)]
#[command(name = "lottery")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn,lottery=info,lottery_deploy=info")]
    log_level: String,

    /// Extra network definitions (TOML) merged over the built-in table
    #[arg(long, global = true)]
    networks: Option<PathBuf>,

    /// Deployer account (defaults to a fixed development account)
    #[arg(long, global = true)]
    deployer: Option<Address>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the lottery
    Deploy {
        /// Network name from the network table
        #[arg(long, default_value = "hardhat")]
        network: String,

        /// Write the interface and address map for the front-end
        #[arg(long, env = "UPDATE_FRONT_END")]
        update_front_end: bool,

        /// Front-end checkout to write into
        #[arg(long, default_value = "../lottery-front-end")]
        front_end_dir: PathBuf,
    },

    /// Deploy, then print the lottery's timing values
    Console {
        #[arg(long, default_value = "hardhat")]
        network: String,
    },

    /// Run one complete round on the development chain
    Simulate {
        /// Number of entrants
        #[arg(short = 'p', long, default_value = "4")]
        players: u8,

        /// Random seed for the oracle latency
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Random word to fulfill with instead of the mock derivation
        #[arg(long)]
        word: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let mut table = NetworkTable::builtin();
    if let Some(path) = &cli.networks {
        table
            .merge_file(path)
            .with_context(|| format!("Failed to load networks from {}", path.display()))?;
    }
    let deployer = cli.deployer.unwrap_or_else(default_deployer);

    match cli.command {
        Command::Deploy {
            network,
            update_front_end,
            front_end_dir,
        } => {
            let mut runner = SimulationRunner::new(SimulationConfig::default(), 0);
            let deployment = deploy(&mut runner, &network, &table, deployer)?;
            print_deployment(&deployment);

            if update_front_end {
                let exporter = FrontEndExporter::in_dir(&front_end_dir);
                exporter.export(&deployment).with_context(|| {
                    format!("Failed to update front end in {}", front_end_dir.display())
                })?;
                println!("Front end:    {}", front_end_dir.display());
            }
        }
        Command::Console { network } => {
            let mut runner = SimulationRunner::new(SimulationConfig::default(), 0);
            deploy(&mut runner, &network, &table, deployer)?;
            let lottery = runner
                .lottery()
                .context("Lottery missing after deploy")?;

            println!("Last timestamp: {}", lottery.last_timestamp().as_secs());
            println!("Interval:       {}", lottery.interval().as_secs());
            println!("Current time:   {}", lottery.block_timestamp().as_secs());
        }
        Command::Simulate {
            players,
            seed,
            word,
        } => simulate(&table, deployer, players, seed, word)?,
    }

    Ok(())
}

fn default_deployer() -> Address {
    Address::from_hash(&Hash::from_bytes(b"lottery-deployer"))
}

/// Deploy. When targeting a live network, first stand up the configured
/// coordinator and subscription so the deploy behaves as it would on a fork,
/// then register the lottery as the subscription owner would.
fn deploy(
    runner: &mut SimulationRunner,
    network: &str,
    table: &NetworkTable,
    deployer: Address,
) -> Result<Deployment> {
    let (chain_id, config) = table
        .resolve(network)
        .with_context(|| format!("Cannot deploy to '{network}'"))?;
    let forked = !config.is_development();

    if forked {
        if let Some(address) = config.vrf_coordinator {
            let limit = config
                .callback_gas_limit
                .unwrap_or_default()
                .max(CoordinatorConfig::default().max_callback_gas_limit);
            runner.install_coordinator(
                address,
                CoordinatorConfig::default().with_max_callback_gas_limit(limit),
            );
            info!(chain = %chain_id, coordinator = %address, "Forked coordinator installed");

            if let Some(subscription_id) = config.subscription_id {
                runner
                    .restore_subscription(subscription_id, deployer, FUND_AMOUNT)
                    .with_context(|| format!("Failed to fork subscription {subscription_id}"))?;
                info!(subscription = %subscription_id, "Forked subscription restored");
            }
        }
    }

    let deployment = deploy_lottery(runner, network, table, deployer)
        .with_context(|| format!("Deployment to '{network}' failed"))?;

    if forked {
        runner
            .add_consumer(deployment.args.subscription_id, deployment.address)
            .context("Failed to register the lottery as consumer")?;
    }
    Ok(deployment)
}

fn print_deployment(deployment: &Deployment) {
    println!("\n=== Lottery Deployed ===");
    println!("Network:      {} ({})", deployment.network, deployment.chain_id);
    println!("Address:      {}", deployment.address);
    println!("Coordinator:  {}", deployment.args.vrf_coordinator);
    println!("Subscription: {}", deployment.args.subscription_id);
    println!(
        "Entrance fee: {} ETH",
        deployment.args.entrance_fee.format_ether()
    );
    println!("Interval:     {}s", deployment.args.interval.as_secs());
    println!("Confirmations: {}", deployment.confirmations);
}

fn simulate(
    table: &NetworkTable,
    deployer: Address,
    players: u8,
    seed: u64,
    word: Option<u64>,
) -> Result<()> {
    if players == 0 {
        bail!("At least one player is required");
    }

    let config = SimulationConfig::default().with_oracle(OracleConfig::manual());
    let mut runner = SimulationRunner::new(config, seed);
    let deployment = deploy(&mut runner, "hardhat", table, deployer)?;
    let fee = deployment.args.entrance_fee;

    let entrants: Vec<Address> = (1..=players)
        .map(|i| Address::from_hash(&Hash::from_parts(&[b"player", &[i]])))
        .collect();
    let starting = fee
        .checked_add(Wei::ONE_ETHER)
        .context("Entrance fee too large")?;
    for player in &entrants {
        runner.fund_account(*player, starting)?;
        runner.enter_lottery(*player, fee)?;
    }
    info!(players, prize = %runner.balance_of(&deployment.address).format_ether(), "Round filled");

    runner.advance_time(deployment.args.interval + Duration::from_secs(1));
    let request_id = runner.perform_upkeep()?;

    match word {
        Some(word) => runner.fulfill_random_words_with_override(
            request_id,
            deployment.address,
            vec![RandomWord::from_u64(word)],
        )?,
        None => runner.fulfill_random_words(request_id, deployment.address)?,
    };

    let lottery = runner.lottery().context("Lottery missing after deploy")?;
    let winner = lottery
        .recent_winner()
        .context("Round finished without a winner")?;

    println!("\n=== Round Complete ===");
    println!("Request:  {request_id}");
    println!("Players:  {players}");
    println!("Winner:   {winner}");
    println!("Balance:  {} ETH", runner.balance_of(&winner).format_ether());
    println!("State:    {}", lottery.lottery_state());
    Ok(())
}
