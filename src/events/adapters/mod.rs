//! Event publisher implementations.

mod broadcast;
mod logging;
mod recording;

pub use broadcast::BroadcastEventPublisher;
pub use logging::TracingEventPublisher;
pub use recording::RecordingEventPublisher;
