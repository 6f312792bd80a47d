//! Event bus on a tokio broadcast channel

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::types::{EventEnvelope, RefereeEvent};

/// Capacity of the broadcast channel
const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of referee events to any number of observers.
///
/// Publishing never blocks and never fails: with no subscribers the event
/// is dropped, and a lagging subscriber loses the oldest events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    /// Number of events published, shared across clones
    published: Arc<AtomicUsize>,
}

impl EventBus {
    /// Create an event bus with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an event bus holding at most `capacity` unread events per
    /// subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Wraps and publishes an event.
    pub fn emit(&self, event: RefereeEvent) -> usize {
        self.publish(EventEnvelope::new(event))
    }

    /// Subscribe to events
    ///
    /// Events published before subscribing are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total number of events published
    pub fn event_count(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("event_count", &self.event_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> RefereeEvent {
        RefereeEvent::GameStarted {
            game_id: "0101001".into(),
            round_number: 1,
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_every_subscriber() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.emit(started()), 2);

        assert_eq!(rx1.recv().await.unwrap().event, started());
        assert_eq!(rx2.recv().await.unwrap().event, started());
    }

    #[tokio::test]
    async fn test_no_subscribers_drops_event() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(started()), 0);
        assert_eq!(bus.event_count(), 1);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_oldest() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();
        for n in 1..=3 {
            bus.emit(RefereeEvent::GameStarted {
                game_id: format!("010100{n}"),
                round_number: 1,
            });
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        let next = rx.recv().await.unwrap();
        assert_eq!(next.event.game_id(), Some("0101002"));
    }

    #[test]
    fn test_clones_share_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();
        let _rx = bus2.subscribe();
        assert_eq!(bus1.subscriber_count(), 1);
        bus2.emit(started());
        assert_eq!(bus1.event_count(), 1);
    }
}
