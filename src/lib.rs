//! Reliefhub: task and need allocation for disaster-relief coordination.
//!
//! Organizations publish relief tasks that volunteers claim one slot at a
//! time; victims report needs that coordinators hand to responders. The
//! crate guarantees that a task is never claimed beyond its capacity, even
//! when many volunteers claim it at once.
//!
//! # Architecture
//!
//! Reliefhub follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence and identity
//! - **Adapters**: In-memory and `PostgreSQL` implementations of ports
//! - **Services**: Orchestration that checks capabilities and publishes events
//!
//! # Modules
//!
//! - [`access`]: Actors, roles, and capability checks
//! - [`task`]: Task lifecycle, claims, and claim admission control
//! - [`need`]: Need reporting, assignment, and resolution
//! - [`events`]: Domain events published after successful writes
//! - [`config`]: Admission limits and timeouts
//! - [`error`]: Failure categories shared by every service
//! - [`pg`]: Connection pooling for the `PostgreSQL` adapters

pub mod access;
pub mod config;
pub mod error;
pub mod events;
pub mod need;
pub mod pg;
pub mod task;
