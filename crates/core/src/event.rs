//! Event types for the deterministic state machines.

use lottery_types::{Address, RandomWord, RequestId, Wei};

/// Priority levels for event ordering within the same timestamp.
///
/// Events at the same simulation time are processed in priority order.
/// Lower values = higher priority (processed first).
///
/// This keeps causality intact: consequences of an event are handled
/// before new external inputs scheduled for the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventPriority {
    /// Internal events: consequences of prior event processing.
    Internal = 0,

    /// Timer events: automation polling.
    Timer = 1,

    /// Oracle events: fulfillments arriving from the randomness oracle.
    Oracle = 2,

    /// Client events: calls submitted by external users.
    Client = 3,
}

/// All inputs the execution environment can receive.
///
/// Events are **passive data** - they describe something that happened or
/// a call someone submitted. Processing an event yields actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // Timers (priority: Timer)
    // ═══════════════════════════════════════════════════════════════════════
    /// Automation poll: run checkUpkeep and, if needed, performUpkeep.
    UpkeepTimer,

    // ═══════════════════════════════════════════════════════════════════════
    // Client calls (priority: Client)
    // ═══════════════════════════════════════════════════════════════════════
    /// A player calls `enterLottery` paying `value`.
    EnterLottery { player: Address, value: Wei },

    /// Someone calls `performUpkeep` directly.
    PerformUpkeep { perform_data: Vec<u8> },

    // ═══════════════════════════════════════════════════════════════════════
    // Oracle (priority: Oracle)
    // ═══════════════════════════════════════════════════════════════════════
    /// The oracle answers a pending request.
    ///
    /// `words` overrides the coordinator's derived words when set.
    FulfillRandomWords {
        request_id: RequestId,
        consumer: Address,
        words: Option<Vec<RandomWord>>,
    },
}

impl Event {
    /// Get the priority of this event for ordering.
    pub fn priority(&self) -> EventPriority {
        match self {
            Event::UpkeepTimer => EventPriority::Timer,
            Event::EnterLottery { .. } | Event::PerformUpkeep { .. } => EventPriority::Client,
            Event::FulfillRandomWords { .. } => EventPriority::Oracle,
        }
    }

    /// Get the event type name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::UpkeepTimer => "UpkeepTimer",
            Event::EnterLottery { .. } => "EnterLottery",
            Event::PerformUpkeep { .. } => "PerformUpkeep",
            Event::FulfillRandomWords { .. } => "FulfillRandomWords",
        }
    }

    /// Check if this is a client-submitted call.
    pub fn is_client_call(&self) -> bool {
        self.priority() == EventPriority::Client
    }
}
