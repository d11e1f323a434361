//! Event payloads.

use crate::access::domain::UserId;
use crate::need::domain::NeedId;
use crate::task::domain::{ClaimId, TaskCascade, TaskId};
use serde::{Deserialize, Serialize};

/// Event emitted after a committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReliefEvent {
    /// A task from a semi-trusted creator awaits review.
    TaskApprovalRequested {
        /// Pending task.
        task_id: TaskId,
        /// Creator of the task.
        creator_id: UserId,
    },
    /// A pending task was approved and is now available.
    TaskApproved {
        /// Approved task.
        task_id: TaskId,
        /// Reviewer.
        approver_id: UserId,
        /// Creator to notify.
        creator_id: UserId,
    },
    /// A pending task was rejected and cancelled.
    TaskRejected {
        /// Rejected task.
        task_id: TaskId,
        /// Reviewer.
        approver_id: UserId,
        /// Creator to notify.
        creator_id: UserId,
    },
    /// A volunteer claimed a slot on a task.
    TaskClaimed {
        /// Claimed task.
        task_id: TaskId,
        /// New claim.
        claim_id: ClaimId,
        /// Claiming user.
        user_id: UserId,
        /// Creator to notify.
        creator_id: UserId,
    },
    /// A volunteer completed their claim.
    ClaimCompleted {
        /// Parent task.
        task_id: TaskId,
        /// Completed claim.
        claim_id: ClaimId,
        /// Claiming user.
        user_id: UserId,
    },
    /// A claim transition changed the parent task's status.
    TaskStatusCascaded {
        /// Affected task.
        task_id: TaskId,
        /// Transition applied to the task.
        cascade: TaskCascade,
    },
    /// A need was assigned to a responsible user.
    NeedAssigned {
        /// Assigned need.
        need_id: NeedId,
        /// Responsible user.
        assignee_id: UserId,
        /// User who made the assignment.
        assigned_by: UserId,
    },
    /// A need was resolved.
    NeedResolved {
        /// Resolved need.
        need_id: NeedId,
        /// Reporter to notify.
        reporter_id: UserId,
        /// Assignee to notify, if any.
        assignee_id: Option<UserId>,
    },
}

impl ReliefEvent {
    /// Returns the event name used in logs and by consumers.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TaskApprovalRequested { .. } => "task_approval_requested",
            Self::TaskApproved { .. } => "task_approved",
            Self::TaskRejected { .. } => "task_rejected",
            Self::TaskClaimed { .. } => "task_claimed",
            Self::ClaimCompleted { .. } => "claim_completed",
            Self::TaskStatusCascaded { .. } => "task_status_cascaded",
            Self::NeedAssigned { .. } => "need_assigned",
            Self::NeedResolved { .. } => "need_resolved",
        }
    }
}
