//! Domain events emitted by the allocation engine.
//!
//! Events are fire-and-forget: services publish them after a successful
//! commit and never wait on, or fail because of, the consumer. Delivery of
//! notifications is left to whatever subscribes to a publisher.

pub mod adapters;
mod event;
mod publisher;

pub use event::ReliefEvent;
pub use publisher::EventPublisher;

#[cfg(test)]
pub use publisher::MockEventPublisher;
