//! Primitive types for the lottery round engine.
//!
//! This crate provides the value types shared by every other crate in the
//! workspace:
//!
//! - **Primitives**: [`Hash`], [`Address`], [`Wei`], [`RandomWord`]
//! - **Identifiers**: [`RequestId`], [`SubscriptionId`], [`ChainId`], [`GasLane`]
//! - **Round state**: [`LotteryState`]
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend on
//! any other workspace crates, making it the foundation layer.

mod address;
mod amount;
mod hash;
mod identifiers;
mod randomness;
mod state;

pub use address::Address;
pub use amount::{AmountParseError, Wei, ETHER_DECIMALS};
pub use hash::{Hash, HexError};
pub use identifiers::{ChainId, GasLane, RequestId, SubscriptionId};
pub use randomness::RandomWord;
pub use state::LotteryState;

/// Test utilities.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::*;

    /// Create a deterministic test address from a seed byte.
    pub fn test_address(seed: u8) -> Address {
        Address::from_hash(&Hash::from_parts(&[b"test-account", &[seed]]))
    }

    /// Create `count` distinct test addresses.
    pub fn test_addresses(count: u8) -> Vec<Address> {
        (0..count).map(test_address).collect()
    }

    /// The fee used throughout the tests: 0.1 units.
    pub fn test_entrance_fee() -> Wei {
        Wei(Wei::ONE_ETHER.0 / 10)
    }

    /// The gas lane configured for the development and sepolia networks.
    pub fn test_gas_lane() -> GasLane {
        GasLane(
            Hash::from_hex("0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c")
                .expect("valid gas lane"),
        )
    }
}
