//! Publisher that keeps every event in memory.

use crate::events::{EventPublisher, ReliefEvent};
use std::sync::{Arc, Mutex};

/// Records published events for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventPublisher {
    events: Arc<Mutex<Vec<ReliefEvent>>>,
}

impl RecordingEventPublisher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event in publication order.
    #[must_use]
    pub fn events(&self) -> Vec<ReliefEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the names of recorded events in publication order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(ReliefEvent::name).collect()
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish(&self, event: &ReliefEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
