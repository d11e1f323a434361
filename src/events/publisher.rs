//! Publisher port.

use super::ReliefEvent;

/// Sink for domain events.
///
/// Implementations must not block; publishing never fails from the caller's
/// point of view.
#[cfg_attr(test, mockall::automock)]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    fn publish(&self, event: &ReliefEvent);
}
