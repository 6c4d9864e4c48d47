//! Broadcast channel for map messages.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Services publish
//! [`MapMessage`]s and every WebSocket connection subscribes to receive
//! them, filtered by channel.

use tokio::sync::broadcast;

use super::MapMessage;

/// Broadcast bus for [`MapMessage`]s.
///
/// When the ring buffer is full, the oldest messages are dropped for
/// lagging receivers. Publishing never blocks and never fails.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MapMessage>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a message to all subscribers.
    ///
    /// Returns the number of receivers. With no receivers the message is
    /// silently dropped.
    pub fn publish(&self, message: MapMessage) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    /// Creates a new receiver for all future messages.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MapMessage> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
