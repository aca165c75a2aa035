//! Deterministic simulated execution environment.
//!
//! Plays the role of the chain for the lottery: serialized calls, a
//! simulated clock, account balances, an automation keeper and an oracle
//! that answers randomness requests after a seeded, jittered delay.
//!
//! # Example
//!
//! ```no_run
//! use lottery_simulation::{SimulationConfig, SimulationRunner};
//! use std::time::Duration;
//!
//! let mut runner = SimulationRunner::new(SimulationConfig::default(), 42);
//! // deploy a coordinator and a lottery, enter players, then:
//! runner.run_until(Duration::from_secs(120));
//! ```
//!
//! The only state machine is [`ChainState`]; everything it wants done comes
//! back as [`Action`](lottery_core::Action)s, which the runner executes:
//! notifications go to the registered sinks, timers and oracle deliveries
//! go on the event queue.

mod chain;
mod error;
mod event_queue;
mod ledger;
mod runner;

pub use chain::{ChainState, Execution, KeeperConfig};
pub use error::ChainError;
pub use event_queue::EventKey;
pub use ledger::AccountLedger;
pub use runner::{OracleConfig, Receipt, SimulationConfig, SimulationRunner, SimulationStats};
