//! Action types for the deterministic state machines.

use crate::{LogEvent, TimerId};
use lottery_types::{Address, RequestId};
use std::time::Duration;

/// Actions a state machine wants performed.
///
/// Actions are **commands** - they describe something to do.
/// The runner executes actions and may convert results back into events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // Notifications
    // ═══════════════════════════════════════════════════════════════════════
    /// Publish a notification on behalf of `emitter`.
    Emit { emitter: Address, event: LogEvent },

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Set a timer to fire after a duration.
    SetTimer { id: TimerId, duration: Duration },

    /// Cancel a previously set timer.
    CancelTimer { id: TimerId },

    // ═══════════════════════════════════════════════════════════════════════
    // Oracle
    // ═══════════════════════════════════════════════════════════════════════
    /// A randomness request was accepted; the oracle should answer it.
    ///
    /// The runner decides when (latency) and whether (auto-fulfill) the
    /// answer arrives.
    DeliverRandomness {
        request_id: RequestId,
        consumer: Address,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Outcomes
    // ═══════════════════════════════════════════════════════════════════════
    /// A submitted call was rejected and reverted.
    CallReverted { call: &'static str, reason: String },
}

impl Action {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Emit { .. } => "Emit",
            Action::SetTimer { .. } => "SetTimer",
            Action::CancelTimer { .. } => "CancelTimer",
            Action::DeliverRandomness { .. } => "DeliverRandomness",
            Action::CallReverted { .. } => "CallReverted",
        }
    }

    /// Shorthand for an [`Action::Emit`].
    pub fn emit(emitter: Address, event: impl Into<LogEvent>) -> Self {
        Action::Emit {
            emitter,
            event: event.into(),
        }
    }
}
