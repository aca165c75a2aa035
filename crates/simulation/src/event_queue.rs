//! Deterministic event ordering.

use lottery_core::{Event, EventPriority};
use std::time::Duration;

/// Key for the global event queue.
///
/// Events are ordered by time, then priority, then insertion sequence, so
/// the queue drains identically on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub time: Duration,
    pub priority: EventPriority,
    pub sequence: u64,
}

impl EventKey {
    pub fn new(time: Duration, event: &Event, sequence: u64) -> Self {
        Self {
            time,
            priority: event.priority(),
            sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_types::test_utils::test_address;
    use lottery_types::{RequestId, Wei};
    use std::collections::BTreeMap;

    #[test]
    fn test_same_instant_orders_by_priority_then_sequence() {
        let t = Duration::from_secs(5);
        let enter = Event::EnterLottery {
            player: test_address(1),
            value: Wei(1),
        };
        let fulfill = Event::FulfillRandomWords {
            request_id: RequestId(1),
            consumer: test_address(2),
            words: None,
        };

        let mut queue = BTreeMap::new();
        queue.insert(EventKey::new(t, &enter, 1), "enter-1");
        queue.insert(EventKey::new(t, &fulfill, 2), "fulfill");
        queue.insert(EventKey::new(t, &Event::UpkeepTimer, 3), "timer");
        queue.insert(EventKey::new(t, &enter, 4), "enter-2");
        queue.insert(
            EventKey::new(Duration::from_secs(1), &enter, 5),
            "earlier",
        );

        let order: Vec<_> = queue.into_values().collect();
        assert_eq!(order, vec!["earlier", "timer", "fulfill", "enter-1", "enter-2"]);
    }
}
