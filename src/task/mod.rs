//! Relief tasks, volunteer claims, and claim admission control.
//!
//! Tasks are created and reviewed through [`services::TaskLifecycleService`].
//! Volunteers compete for a task's fixed number of slots through
//! [`services::ClaimAdmissionService`], which validates every claim again
//! under the task lock so concurrent claimants never overcommit a task. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
