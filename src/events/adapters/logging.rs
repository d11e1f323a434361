//! Publisher that writes events to the `tracing` log.

use crate::events::{EventPublisher, ReliefEvent};
use tracing::info;

/// Logs every event at `info` level under the `reliefhub::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: &ReliefEvent) {
        let payload = serde_json::to_string(event).unwrap_or_default();
        info!(target: "reliefhub::events", event = event.name(), %payload, "domain event");
    }
}
