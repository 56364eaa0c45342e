//! Event broadcasting for pipeline observers.

use dynplay_types::PlayerEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Fan-out of [`PlayerEvent`]s to any number of subscribers.
///
/// Sending never blocks, so it is safe to call from GStreamer streaming
/// threads. Subscribers that fall behind lose the oldest events.
#[derive(Clone)]
pub struct EventBroadcaster {
    /// Broadcast channel for events
    sender: Arc<broadcast::Sender<PlayerEvent>>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster with a buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Broadcast an event to all subscribers.
    pub fn broadcast(&self, event: PlayerEvent) {
        debug!("Broadcasting event: {}", event.description());
        // Err only means nobody is subscribed
        let _ = self.sender.send(event);
    }

    /// Subscribe to events broadcast from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100) // Default buffer of 100 events
    }
}

/// Drain every event currently queued on a receiver without blocking.
pub fn drain(receiver: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                debug!("Event receiver lagged, {} event(s) skipped", skipped);
            }
            Err(_) => break,
        }
    }
    events
}
