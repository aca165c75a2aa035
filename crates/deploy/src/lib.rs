//! Deployment tooling for the lottery.
//!
//! - [`NetworkTable`]: per-chain parameters, with built-in entries for the
//!   development chain, sepolia and mainnet, and TOML overrides
//! - [`deploy_lottery`]: provisions the coordinator subscription on
//!   development chains and deploys the lottery
//! - [`FrontEndExporter`]: writes the interface and address map consumed by
//!   the web front-end
//!
//! The `lottery` binary wraps these behind a small CLI.

mod deploy;
mod error;
mod frontend;
mod interface;
mod networks;

pub use deploy::{deploy_lottery, Deployment, FUND_AMOUNT};
pub use error::{DeployError, ExportError};
pub use frontend::{ContractAddresses, FrontEndExporter};
pub use interface::lottery_interface;
pub use networks::{
    block_confirmations, is_development_chain, require, NetworkConfig, NetworkTable,
    DEVELOPMENT_CHAINS, VERIFICATION_BLOCK_CONFIRMATIONS,
};
