//! Port contracts for tasks and claims.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod ledger;
pub mod references;
pub mod repository;

pub use ledger::{
    AdmissionOutcome, AdmissionRequest, ClaimLedger, ClaimTransition, TransitionOutcome,
};
#[cfg(test)]
pub use references::MockTaskReferences;
pub use references::TaskReferences;
pub use repository::{
    TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskStatistics,
    TaskVisibility,
};
