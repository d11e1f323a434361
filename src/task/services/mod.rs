//! Application services for tasks and claims.

mod admission;
mod conflict;
mod lifecycle;

pub use admission::{ClaimAdmissionError, ClaimAdmissionResult, ClaimAdmissionService};
pub use conflict::ConflictChecker;
pub use lifecycle::{
    CreateTaskRequest, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
};
