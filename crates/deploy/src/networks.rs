//! Per-network deployment parameters.

use crate::DeployError;
use lottery_types::{Address, ChainId, GasLane, Hash, SubscriptionId, Wei};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Networks where the deployer provisions its own mock coordinator.
pub const DEVELOPMENT_CHAINS: &[&str] = &["hardhat", "localhost"];

/// Confirmations to wait for on live networks.
pub const VERIFICATION_BLOCK_CONFIRMATIONS: u32 = 6;

const DEFAULT_GAS_LANE: &str = "0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c";

/// Deployment parameters for one chain. Every field except the name may be
/// absent; the deployer decides which ones it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub vrf_coordinator: Option<Address>,
    pub entrance_fee: Option<Wei>,
    pub gas_lane: Option<GasLane>,
    pub subscription_id: Option<SubscriptionId>,
    pub callback_gas_limit: Option<u32>,
    pub interval: Option<Duration>,
}

impl NetworkConfig {
    /// Entry with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vrf_coordinator: None,
            entrance_fee: None,
            gas_lane: None,
            subscription_id: None,
            callback_gas_limit: None,
            interval: None,
        }
    }

    pub fn is_development(&self) -> bool {
        is_development_chain(&self.name)
    }
}

/// Read a required field, failing with [`DeployError::MissingField`].
pub fn require<T>(value: Option<T>, chain: ChainId, field: &'static str) -> Result<T, DeployError> {
    value.ok_or(DeployError::MissingField { chain, field })
}

pub fn is_development_chain(name: &str) -> bool {
    DEVELOPMENT_CHAINS.contains(&name)
}

/// Confirmations to wait for after deploying to `network`.
pub fn block_confirmations(network: &str) -> u32 {
    if is_development_chain(network) {
        1
    } else {
        VERIFICATION_BLOCK_CONFIRMATIONS
    }
}

/// Network configurations keyed by chain id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkTable {
    networks: BTreeMap<ChainId, NetworkConfig>,
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkTable {
    pub fn empty() -> Self {
        Self {
            networks: BTreeMap::new(),
        }
    }

    /// The hardhat, sepolia and mainnet entries.
    pub fn builtin() -> Self {
        let gas_lane = Hash::from_hex(DEFAULT_GAS_LANE).ok().map(GasLane);
        let fee = Some(Wei(Wei::ONE_ETHER.0 / 10));

        let mut table = Self::empty();
        table.insert(
            ChainId::HARDHAT,
            NetworkConfig {
                entrance_fee: fee,
                gas_lane,
                subscription_id: Some(SubscriptionId(588)),
                callback_gas_limit: Some(500_000),
                interval: Some(Duration::from_secs(30)),
                ..NetworkConfig::named("hardhat")
            },
        );
        table.insert(
            ChainId::SEPOLIA,
            NetworkConfig {
                vrf_coordinator: Address::from_hex("0x8103B0A8A00be2DDC778e6e7eaa21791Cd364625")
                    .ok(),
                entrance_fee: fee,
                gas_lane,
                subscription_id: Some(SubscriptionId(6623)),
                callback_gas_limit: Some(5_000_000),
                interval: Some(Duration::from_secs(180)),
                ..NetworkConfig::named("sepolia")
            },
        );
        table.insert(
            ChainId::MAINNET,
            NetworkConfig {
                interval: Some(Duration::from_secs(30)),
                ..NetworkConfig::named("mainnet")
            },
        );
        table
    }

    pub fn insert(&mut self, chain_id: ChainId, config: NetworkConfig) {
        self.networks.insert(chain_id, config);
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&NetworkConfig> {
        self.networks.get(&chain_id)
    }

    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &NetworkConfig)> {
        self.networks.iter().map(|(id, config)| (*id, config))
    }

    /// Find a network by name. `localhost` resolves to the hardhat chain.
    pub fn resolve(&self, name: &str) -> Result<(ChainId, &NetworkConfig), DeployError> {
        if name == "localhost" {
            if let Some(config) = self.get(ChainId::HARDHAT) {
                return Ok((ChainId::HARDHAT, config));
            }
        }
        self.networks
            .iter()
            .find(|(_, config)| config.name == name)
            .map(|(id, config)| (*id, config))
            .ok_or_else(|| DeployError::UnknownNetwork(name.to_string()))
    }

    /// Load overrides from a TOML file. See [`merge_toml`](Self::merge_toml).
    pub fn merge_file(&mut self, path: &Path) -> Result<(), DeployError> {
        let contents = fs::read_to_string(path).map_err(|source| DeployError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_toml(&contents)
    }

    /// Apply overrides from TOML text.
    ///
    /// ```toml
    /// [networks.31337]
    /// entrance_fee = "0.25"
    /// interval_secs = 60
    ///
    /// [networks.80001]
    /// name = "mumbai"
    /// vrf_coordinator = "0x7a1BaC17Ccc5b313516C5E16fb24f7659aA5ebed"
    /// ```
    ///
    /// Fields present override the existing entry; absent fields are kept.
    /// A new chain must have a name.
    pub fn merge_toml(&mut self, contents: &str) -> Result<(), DeployError> {
        let file: NetworkFile = toml::from_str(contents)?;

        for (key, entry) in file.networks {
            let chain = key
                .parse::<u64>()
                .map(ChainId)
                .map_err(|e| DeployError::InvalidValue {
                    chain: ChainId(0),
                    field: "chain id",
                    reason: format!("{key}: {e}"),
                })?;

            let mut config = match (self.networks.get(&chain).cloned(), &entry.name) {
                (Some(existing), _) => existing,
                (None, Some(name)) => NetworkConfig::named(name.clone()),
                (None, None) => {
                    return Err(DeployError::MissingField {
                        chain,
                        field: "name",
                    })
                }
            };
            entry.apply(chain, &mut config)?;
            tracing::debug!(chain = %chain, name = %config.name, "Network override applied");
            self.networks.insert(chain, config);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct NetworkFile {
    #[serde(default)]
    networks: BTreeMap<String, NetworkEntry>,
}

/// One `[networks.<chain id>]` table. The fee is in ether.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkEntry {
    name: Option<String>,
    vrf_coordinator: Option<Address>,
    entrance_fee: Option<String>,
    gas_lane: Option<GasLane>,
    subscription_id: Option<SubscriptionId>,
    callback_gas_limit: Option<u32>,
    interval_secs: Option<u64>,
}

impl NetworkEntry {
    fn apply(self, chain: ChainId, config: &mut NetworkConfig) -> Result<(), DeployError> {
        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(fee) = self.entrance_fee {
            let fee = Wei::parse_ether(&fee).map_err(|e| DeployError::InvalidValue {
                chain,
                field: "entrance_fee",
                reason: e.to_string(),
            })?;
            config.entrance_fee = Some(fee);
        }
        config.vrf_coordinator = self.vrf_coordinator.or(config.vrf_coordinator);
        config.gas_lane = self.gas_lane.or(config.gas_lane);
        config.subscription_id = self.subscription_id.or(config.subscription_id);
        config.callback_gas_limit = self.callback_gas_limit.or(config.callback_gas_limit);
        if let Some(secs) = self.interval_secs {
            config.interval = Some(Duration::from_secs(secs));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let table = NetworkTable::builtin();

        let hardhat = table.get(ChainId::HARDHAT).unwrap();
        assert_eq!(hardhat.name, "hardhat");
        assert_eq!(hardhat.entrance_fee, Some(Wei::parse_ether("0.1").unwrap()));
        assert_eq!(hardhat.subscription_id, Some(SubscriptionId(588)));
        assert_eq!(hardhat.callback_gas_limit, Some(500_000));
        assert_eq!(hardhat.interval, Some(Duration::from_secs(30)));
        assert!(hardhat.vrf_coordinator.is_none());
        assert_eq!(
            hardhat.gas_lane.unwrap().to_string(),
            DEFAULT_GAS_LANE
        );

        let sepolia = table.get(ChainId::SEPOLIA).unwrap();
        assert_eq!(
            sepolia.vrf_coordinator,
            Some(Address::from_hex("0x8103b0a8a00be2ddc778e6e7eaa21791cd364625").unwrap())
        );
        assert_eq!(sepolia.subscription_id, Some(SubscriptionId(6623)));
        assert_eq!(sepolia.callback_gas_limit, Some(5_000_000));
        assert_eq!(sepolia.interval, Some(Duration::from_secs(180)));

        let mainnet = table.get(ChainId::MAINNET).unwrap();
        assert_eq!(mainnet.interval, Some(Duration::from_secs(30)));
        assert!(mainnet.entrance_fee.is_none());
    }

    #[test]
    fn test_resolve_by_name() {
        let table = NetworkTable::builtin();
        assert_eq!(table.resolve("sepolia").unwrap().0, ChainId::SEPOLIA);
        assert_eq!(table.resolve("localhost").unwrap().0, ChainId::HARDHAT);
        assert!(matches!(
            table.resolve("goerli"),
            Err(DeployError::UnknownNetwork(name)) if name == "goerli"
        ));
    }

    #[test]
    fn test_development_chains() {
        assert!(is_development_chain("hardhat"));
        assert!(is_development_chain("localhost"));
        assert!(!is_development_chain("sepolia"));
        assert_eq!(block_confirmations("localhost"), 1);
        assert_eq!(block_confirmations("mainnet"), 6);
    }

    #[test]
    fn test_require_reports_field() {
        let mainnet = NetworkTable::builtin();
        let config = mainnet.get(ChainId::MAINNET).unwrap();
        let err = require(config.vrf_coordinator, ChainId::MAINNET, "vrf_coordinator").unwrap_err();
        assert_eq!(
            err.to_string(),
            "network config for chain 1 is missing 'vrf_coordinator'"
        );
    }

    #[test]
    fn test_merge_overrides_and_adds() {
        let mut table = NetworkTable::builtin();
        table
            .merge_toml(
                r#"
                [networks.31337]
                entrance_fee = "0.25"
                interval_secs = 60

                [networks.80001]
                name = "mumbai"
                vrf_coordinator = "0x7a1BaC17Ccc5b313516C5E16fb24f7659aA5ebed"
                subscription_id = 12
                "#,
            )
            .unwrap();

        let hardhat = table.get(ChainId::HARDHAT).unwrap();
        assert_eq!(hardhat.entrance_fee, Some(Wei::parse_ether("0.25").unwrap()));
        assert_eq!(hardhat.interval, Some(Duration::from_secs(60)));
        assert_eq!(hardhat.subscription_id, Some(SubscriptionId(588)));

        let (chain, mumbai) = table.resolve("mumbai").unwrap();
        assert_eq!(chain, ChainId(80001));
        assert_eq!(mumbai.subscription_id, Some(SubscriptionId(12)));
        assert!(mumbai.vrf_coordinator.is_some());
    }

    #[test]
    fn test_merge_rejects_bad_input() {
        let mut table = NetworkTable::builtin();
        assert!(matches!(
            table.merge_toml("[networks.5]\ninterval_secs = 10\n"),
            Err(DeployError::MissingField { field: "name", .. })
        ));
        assert!(matches!(
            table.merge_toml("[networks.31337]\nentrance_fee = \"lots\"\n"),
            Err(DeployError::InvalidValue { field: "entrance_fee", .. })
        ));
        assert!(matches!(
            table.merge_toml("[networks.abc]\nname = \"x\"\n"),
            Err(DeployError::InvalidValue { .. })
        ));
        assert!(matches!(
            table.merge_toml("[networks.31337]\nbogus = 1\n"),
            Err(DeployError::Parse(_))
        ));
    }
}
