//! Broadcast channel for connection lifecycle events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The connection
//! store publishes a [`ConnectionEvent`] whenever the held connection opens
//! or closes; anything interested subscribes instead of registering
//! callbacks on the socket.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::handle::ConnectionId;

/// What happened to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionEventKind {
    /// The socket finished its handshake.
    Opened,
    /// The socket is gone, whether it ever opened or not.
    Closed,
}

/// A lifecycle event for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionEvent {
    /// Connection the event belongs to.
    pub connection_id: ConnectionId,
    /// Endpoint the connection targets.
    pub url: String,
    /// Event discriminator.
    pub kind: ConnectionEventKind,
    /// When the store observed the transition.
    pub timestamp: DateTime<Utc>,
}

/// Broadcast bus for [`ConnectionEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ConnectionEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    ///
    /// A capacity of zero is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: ConnectionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_event(kind: ConnectionEventKind) -> ConnectionEvent {
        ConnectionEvent {
            connection_id: ConnectionId::new(),
            url: "ws://localhost:9999".to_string(),
            kind,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(make_event(ConnectionEventKind::Opened)), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let event = make_event(ConnectionEventKind::Closed);
        bus.publish(event.clone());

        let Ok(received) = rx.recv().await else {
            panic!("expected to receive event");
        };
        assert_eq!(received, event);
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(8);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }

    #[test]
    fn zero_capacity_is_usable() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(make_event(ConnectionEventKind::Opened)), 1);
    }

    #[test]
    fn event_serializes_with_snake_case_kind() {
        let Ok(json) = serde_json::to_value(make_event(ConnectionEventKind::Opened)) else {
            panic!("serialization failed");
        };
        assert_eq!(json["kind"], "opened");
        assert_eq!(json["url"], "ws://localhost:9999");
    }
}
