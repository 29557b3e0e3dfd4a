//! Event dispatch.
//!
//! Subscribers declare the event types they care about once, at
//! registration; the bus indexes them by type so dispatch never scans
//! uninterested subscribers. For each event type, subscribers are called in
//! priority order (higher first), then by registration order for stability.

use rustc_hash::FxHashMap;

use crate::core::SubscriberError;

use super::event::{EventType, MatchEvent};

/// Identifier handed out at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(pub u32);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscriber({})", self.0)
    }
}

/// Receives match events synchronously.
///
/// Returning an error fails the round step that emitted the event.
pub trait EventSubscriber: Send {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Event types this subscriber receives. Read once at registration.
    fn interests(&self) -> Vec<EventType> {
        EventType::ALL.to_vec()
    }

    /// Higher priority subscribers are called first.
    fn priority(&self) -> i32 {
        0
    }

    fn on_event(&mut self, event: &MatchEvent) -> Result<(), SubscriberError>;
}

struct Entry {
    id: SubscriberId,
    priority: i32,
    subscriber: Box<dyn EventSubscriber>,
}

/// Registry of subscribers indexed by event type.
#[derive(Default)]
pub struct EventBus {
    entries: Vec<Entry>,
    by_type: FxHashMap<EventType, Vec<usize>>,
    next_id: u32,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, returns its ID.
    pub fn register(&mut self, subscriber: Box<dyn EventSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        let index = self.entries.len();
        let priority = subscriber.priority();
        let mut interests = subscriber.interests();
        interests.sort();
        interests.dedup();

        self.entries.push(Entry {
            id,
            priority,
            subscriber,
        });

        for event_type in interests {
            let list = self.by_type.entry(event_type).or_default();
            list.push(index);
            let entries = &self.entries;
            list.sort_by(|&a, &b| {
                entries[b]
                    .priority
                    .cmp(&entries[a].priority)
                    .then(entries[a].id.cmp(&entries[b].id))
            });
        }

        tracing::debug!(subscriber = %id, priority, "registered event subscriber");
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of subscribers receiving `event_type`.
    #[must_use]
    pub fn listeners(&self, event_type: EventType) -> usize {
        self.by_type.get(&event_type).map_or(0, Vec::len)
    }

    /// Deliver an event. Stops at the first subscriber error.
    pub fn dispatch(&mut self, event: &MatchEvent) -> Result<(), SubscriberError> {
        let Some(indices) = self.by_type.get(&event.event_type) else {
            return Ok(());
        };
        for &index in indices {
            self.entries[index].subscriber.on_event(event)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UnitId;
    use crate::events::EventPayload;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: String,
        priority: i32,
        interests: Vec<EventType>,
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl EventSubscriber for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn interests(&self) -> Vec<EventType> {
            self.interests.clone()
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn on_event(&mut self, event: &MatchEvent) -> Result<(), SubscriberError> {
            self.seen.lock().unwrap().push(format!("{}:{}", self.name, event.seq));
            if self.fail {
                Err(SubscriberError::new(&self.name, "rejected"))
            } else {
                Ok(())
            }
        }
    }

    fn recorder(name: &str, priority: i32, interests: Vec<EventType>, seen: &Arc<Mutex<Vec<String>>>) -> Box<Recorder> {
        Box::new(Recorder {
            name: name.into(),
            priority,
            interests,
            seen: Arc::clone(seen),
            fail: false,
        })
    }

    fn knockout(seq: u64) -> MatchEvent {
        MatchEvent::new(
            seq,
            "m",
            1,
            [UnitId::new(1)],
            EventPayload::KnockedOut {
                cause: crate::events::KnockoutCause::Exhaustion,
            },
        )
    }

    #[test]
    fn test_dispatch_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.register(recorder("low", 0, vec![EventType::KnockedOut], &seen));
        bus.register(recorder("high", 5, vec![EventType::KnockedOut], &seen));
        bus.register(recorder("low2", 0, vec![EventType::KnockedOut], &seen));

        bus.dispatch(&knockout(7)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["high:7", "low:7", "low2:7"]);
    }

    #[test]
    fn test_interest_filtering() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.register(recorder("levels", 0, vec![EventType::LevelUp], &seen));

        bus.dispatch(&knockout(1)).unwrap();
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(bus.listeners(EventType::LevelUp), 1);
        assert_eq!(bus.listeners(EventType::KnockedOut), 0);
    }

    #[test]
    fn test_error_stops_dispatch() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let mut failing = recorder("bad", 10, vec![EventType::KnockedOut], &seen);
        failing.fail = true;
        bus.register(failing);
        bus.register(recorder("after", 0, vec![EventType::KnockedOut], &seen));

        let err = bus.dispatch(&knockout(2)).unwrap_err();
        assert_eq!(err.subscriber, "bad");
        assert_eq!(*seen.lock().unwrap(), vec!["bad:2"]);
    }
}
