//! Typed notifications published to external listeners.
//!
//! State machines never talk to listeners directly. They return
//! [`Action::Emit`](crate::Action::Emit) and the runner stamps each
//! notification with its emitter and time before handing it to every
//! registered [`EventSink`].

use lottery_types::{Address, GasLane, RequestId, SubscriptionId, Wei};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Notifications emitted by the lottery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotteryEvent {
    /// A player entered the current round.
    LotteryEnter { player: Address },
    /// Upkeep closed the round and asked the oracle for randomness.
    RequestedLotteryWinner { request_id: RequestId },
    /// The round was settled and the prize paid out.
    WinnerPicked { winner: Address },
}

impl LotteryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LotteryEvent::LotteryEnter { .. } => "LotteryEnter",
            LotteryEvent::RequestedLotteryWinner { .. } => "RequestedLotteryWinner",
            LotteryEvent::WinnerPicked { .. } => "WinnerPicked",
        }
    }
}

/// Notifications emitted by the randomness coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorEvent {
    SubscriptionCreated {
        subscription_id: SubscriptionId,
        owner: Address,
    },
    SubscriptionFunded {
        subscription_id: SubscriptionId,
        old_balance: Wei,
        new_balance: Wei,
    },
    ConsumerAdded {
        subscription_id: SubscriptionId,
        consumer: Address,
    },
    ConsumerRemoved {
        subscription_id: SubscriptionId,
        consumer: Address,
    },
    RandomWordsRequested {
        request_id: RequestId,
        subscription_id: SubscriptionId,
        consumer: Address,
        gas_lane: GasLane,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },
    /// `success` is false when the consumer callback rejected the words.
    RandomWordsFulfilled {
        request_id: RequestId,
        payment: Wei,
        success: bool,
    },
}

impl CoordinatorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CoordinatorEvent::SubscriptionCreated { .. } => "SubscriptionCreated",
            CoordinatorEvent::SubscriptionFunded { .. } => "SubscriptionFunded",
            CoordinatorEvent::ConsumerAdded { .. } => "ConsumerAdded",
            CoordinatorEvent::ConsumerRemoved { .. } => "ConsumerRemoved",
            CoordinatorEvent::RandomWordsRequested { .. } => "RandomWordsRequested",
            CoordinatorEvent::RandomWordsFulfilled { .. } => "RandomWordsFulfilled",
        }
    }
}

/// Any notification a contract can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogEvent {
    Lottery(LotteryEvent),
    Coordinator(CoordinatorEvent),
}

impl LogEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LogEvent::Lottery(e) => e.name(),
            LogEvent::Coordinator(e) => e.name(),
        }
    }

    /// The lottery notification, if this is one.
    pub fn as_lottery(&self) -> Option<&LotteryEvent> {
        match self {
            LogEvent::Lottery(e) => Some(e),
            LogEvent::Coordinator(_) => None,
        }
    }

    /// The coordinator notification, if this is one.
    pub fn as_coordinator(&self) -> Option<&CoordinatorEvent> {
        match self {
            LogEvent::Coordinator(e) => Some(e),
            LogEvent::Lottery(_) => None,
        }
    }
}

impl From<LotteryEvent> for LogEvent {
    fn from(event: LotteryEvent) -> Self {
        LogEvent::Lottery(event)
    }
}

impl From<CoordinatorEvent> for LogEvent {
    fn from(event: CoordinatorEvent) -> Self {
        LogEvent::Coordinator(event)
    }
}

/// A notification stamped with its emitter and emission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub emitter: Address,
    pub timestamp: Duration,
    pub event: LogEvent,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:?}] {} {}",
            self.timestamp,
            self.emitter,
            self.event.name()
        )
    }
}

/// Observer for emitted notifications.
pub trait EventSink: Send {
    fn publish(&mut self, record: &EventRecord);
}

/// Sink that keeps every record in memory.
///
/// Clones share the same log, so a test can keep one handle and give the
/// other to the runner.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    /// Lottery notifications only, in emission order.
    pub fn lottery_events(&self) -> Vec<LotteryEvent> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| r.event.as_lottery().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn publish(&mut self, record: &EventRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Sink that writes one structured log line per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&mut self, record: &EventRecord) {
        match &record.event {
            LogEvent::Lottery(LotteryEvent::LotteryEnter { player }) => {
                tracing::info!(emitter = %record.emitter, player = %player, "LotteryEnter");
            }
            LogEvent::Lottery(LotteryEvent::RequestedLotteryWinner { request_id }) => {
                tracing::info!(emitter = %record.emitter, request_id = %request_id, "RequestedLotteryWinner");
            }
            LogEvent::Lottery(LotteryEvent::WinnerPicked { winner }) => {
                tracing::info!(emitter = %record.emitter, winner = %winner, "WinnerPicked");
            }
            LogEvent::Coordinator(event) => {
                tracing::debug!(emitter = %record.emitter, ?event, "{}", event.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_types::test_utils::test_address;

    fn record(event: LogEvent) -> EventRecord {
        EventRecord {
            emitter: test_address(100),
            timestamp: Duration::from_secs(1),
            event,
        }
    }

    #[test]
    fn test_recording_sink_clones_share_log() {
        let sink = RecordingSink::new();
        let mut handle: Box<dyn EventSink> = Box::new(sink.clone());

        handle.publish(&record(
            LotteryEvent::LotteryEnter {
                player: test_address(1),
            }
            .into(),
        ));
        handle.publish(&record(
            CoordinatorEvent::RandomWordsFulfilled {
                request_id: RequestId(1),
                payment: Wei::ZERO,
                success: true,
            }
            .into(),
        ));

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.lottery_events(),
            vec![LotteryEvent::LotteryEnter {
                player: test_address(1)
            }]
        );

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_event_names() {
        let event: LogEvent = LotteryEvent::WinnerPicked {
            winner: test_address(2),
        }
        .into();
        assert_eq!(event.name(), "WinnerPicked");
        assert!(event.as_coordinator().is_none());
        assert!(record(event).to_string().contains("WinnerPicked"));
    }

    #[test]
    fn test_records_survive_json() {
        let records = vec![
            record(
                LotteryEvent::RequestedLotteryWinner {
                    request_id: RequestId(3),
                }
                .into(),
            ),
            record(
                CoordinatorEvent::SubscriptionFunded {
                    subscription_id: SubscriptionId(1),
                    old_balance: Wei::ZERO,
                    new_balance: Wei(u128::MAX),
                }
                .into(),
            ),
        ];

        let json = serde_json::to_string(&records).unwrap();
        // Amounts are strings so the full u128 range survives.
        assert!(json.contains(&format!("\"{}\"", u128::MAX)));
        let decoded: Vec<EventRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, records);
    }
}
