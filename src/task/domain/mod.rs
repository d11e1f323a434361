//! Domain model for relief tasks and the claims volunteers hold on them.
//!
//! Tasks carry a fixed capacity (`required_volunteers`). Claims fill that
//! capacity one slot at a time, and claim transitions cascade back into the
//! task as named [`TaskCascade`] transitions. Admission decisions are pure
//! functions of an [`AdmissionSnapshot`] so the same rules run before and
//! inside the committing transaction.

mod admission;
mod claim;
mod details;
mod error;
mod ids;
mod task;

pub use admission::{
    AdmissionRules, AdmissionSnapshot, AdmissionTaskState, ConflictReason, ConflictReport,
};
pub use claim::{Claim, ClaimStatus, ClaimTally, PersistedClaimData};
pub use details::{TaskDetails, TaskLocation, TaskPatch, TaskTitle, TaskType};
pub use error::{ParseTaskValueError, TaskDomainError};
pub use ids::{ClaimId, PriorityLevel, RequiredVolunteers, TaskId};
pub(crate) use ids::uuid_id;
pub use task::{
    ApprovalStatus, PersistedTaskData, Task, TaskCascade, TaskReview, TaskStatus,
};
