//! Deployment and export errors.

use lottery_simulation::ChainError;
use lottery_types::{ChainId, SubscriptionId};
use std::path::PathBuf;

/// Fatal deployment configuration or execution errors.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("unknown network '{0}'")]
    UnknownNetwork(String),

    /// A parameter the deploy needs is not configured for this chain.
    #[error("network config for chain {chain} is missing '{field}'")]
    MissingField { chain: ChainId, field: &'static str },

    #[error("invalid '{field}' for chain {chain}: {reason}")]
    InvalidValue {
        chain: ChainId,
        field: &'static str,
        reason: String,
    },

    /// The configured subscription is not known to the coordinator.
    #[error("subscription {subscription_id} does not exist on chain {chain}")]
    UnknownSubscription {
        chain: ChainId,
        subscription_id: SubscriptionId,
    },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse network table")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Errors while writing front-end artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("i/o error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json in {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
