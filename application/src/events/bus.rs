//! Per-session event bus
//!
//! Each session gets its own `tokio::sync::broadcast` channel, so a busy
//! session never delays delivery for another. Publishing never blocks: a
//! subscriber that falls more than `capacity` events behind observes
//! `RecvError::Lagged`, and a channel without subscribers drops events.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

use super::types::SessionEvent;
use roundtable_domain::SessionId;

/// Channel capacity used when none is configured
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Registry of per-session broadcast channels
pub struct EventBus {
    channels: RwLock<HashMap<SessionId, broadcast::Sender<SessionEvent>>>,
    capacity: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Create the channel for a session (idempotent)
    pub fn open(&self, session_id: &SessionId) {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(session_id.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
    }

    /// Publish an event on its session's channel.
    ///
    /// Returns the number of receivers that got it. Events for sessions
    /// without an open channel are dropped.
    pub fn publish(&self, event: SessionEvent) -> usize {
        let event_type = event.event_type();
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = channels.get(event.session_id()) else {
            debug!(event_type, "Event dropped (no channel)");
            return 0;
        };
        match sender.send(event) {
            Ok(count) => {
                debug!(event_type, receivers = count, "Event published");
                count
            }
            Err(_) => {
                debug!(event_type, "Event published (no receivers)");
                0
            }
        }
    }

    /// Subscribe to a session's events.
    ///
    /// For a closed or unknown session the receiver is already closed and
    /// yields `RecvError::Closed` on the first `recv`.
    pub fn subscribe(&self, session_id: &SessionId) -> broadcast::Receiver<SessionEvent> {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        match channels.get(session_id) {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Drop a session's channel. Receivers drain what is buffered, then see
    /// `RecvError::Closed`.
    pub fn close(&self, session_id: &SessionId) {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels.remove(session_id);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    fn degraded(session: &str, reason: &str) -> SessionEvent {
        SessionEvent::PersistenceDegraded {
            session_id: SessionId::new(session),
            reason: reason.into(),
        }
    }

    #[tokio::test]
    async fn test_events_stay_on_their_session() {
        let bus = EventBus::new();
        let a = SessionId::new("a");
        let b = SessionId::new("b");
        bus.open(&a);
        bus.open(&b);
        let mut rx_a = bus.subscribe(&a);
        let mut rx_b = bus.subscribe(&b);

        assert_eq!(bus.publish(degraded("a", "1")), 1);
        assert_eq!(bus.publish(degraded("b", "2")), 1);

        assert_eq!(rx_a.recv().await.unwrap(), degraded("a", "1"));
        assert_eq!(rx_b.recv().await.unwrap(), degraded("b", "2"));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ignored() {
        let bus = EventBus::new();
        let id = SessionId::new("a");
        assert_eq!(bus.publish(degraded("a", "no channel")), 0);
        bus.open(&id);
        assert_eq!(bus.publish(degraded("a", "no receivers")), 0);
        let mut rx = bus.subscribe(&id);
        assert_eq!(bus.publish(degraded("a", "heard")), 1);
        assert_eq!(rx.recv().await.unwrap(), degraded("a", "heard"));
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_without_blocking() {
        let bus = EventBus::with_capacity(2);
        let id = SessionId::new("a");
        bus.open(&id);
        let mut rx = bus.subscribe(&id);
        for i in 0..5 {
            bus.publish(degraded("a", &i.to_string()));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(rx.recv().await.unwrap(), degraded("a", "3"));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends() {
        let bus = EventBus::new();
        let id = SessionId::new("a");
        bus.open(&id);
        let mut rx = bus.subscribe(&id);
        bus.publish(degraded("a", "last"));
        bus.close(&id);

        assert_eq!(rx.recv().await.unwrap(), degraded("a", "last"));
        assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
        assert!(matches!(bus.subscribe(&id).recv().await, Err(RecvError::Closed)));
        assert_eq!(bus.publish(degraded("a", "after close")), 0);
    }
}
