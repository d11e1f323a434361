//! Publisher backed by a tokio broadcast channel.

use crate::events::{EventPublisher, ReliefEvent};
use tokio::sync::broadcast;
use tracing::debug;

/// Fans events out to any number of subscribers.
///
/// Events published while nobody is subscribed are dropped, and slow
/// subscribers observe `Lagged` rather than blocking the publisher.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<ReliefEvent>,
}

impl BroadcastEventPublisher {
    /// Creates a publisher buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Opens a new subscription.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReliefEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: &ReliefEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(event = event.name(), "no event subscribers");
        }
    }
}
