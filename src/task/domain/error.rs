//! Error types for task domain validation, transitions, and parsing.

use super::{ApprovalStatus, ClaimId, ClaimStatus, TaskId, TaskStatus};
use crate::access::domain::UserId;
use crate::error::FailureKind;
use thiserror::Error;

/// Errors returned while constructing or transitioning task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the storage limit.
    #[error("task title exceeds 200 characters ({0})")]
    TitleTooLong(usize),

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The location address is empty after trimming.
    #[error("task location address must not be empty")]
    EmptyAddress,

    /// The requested volunteer count is outside the accepted range.
    #[error("required volunteers {0} outside 1..=100")]
    InvalidRequiredVolunteers(u32),

    /// The priority level is outside the accepted range.
    #[error("priority level {0} outside 1..=5")]
    InvalidPriorityLevel(u8),

    /// Approval was requested for a task that is not awaiting review.
    #[error("task {task_id} is not pending approval (approval status: {approval_status})")]
    ApprovalNotPending {
        /// Task identifier.
        task_id: TaskId,
        /// Current approval status.
        approval_status: ApprovalStatus,
    },

    /// The task can no longer be edited.
    #[error("task {task_id} cannot be edited in status {status}")]
    NotEditable {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
    },

    /// The task can no longer be deleted.
    #[error("task {task_id} cannot be deleted in status {status}")]
    NotDeletable {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
    },

    /// Someone other than the claimant tried to change a claim.
    #[error("claim {claim_id} does not belong to user {user_id}")]
    NotClaimOwner {
        /// Claim identifier.
        claim_id: ClaimId,
        /// User who attempted the change.
        user_id: UserId,
    },

    /// The claim state machine does not allow the transition.
    #[error("invalid claim transition for {claim_id}: {from} -> {to}")]
    InvalidClaimTransition {
        /// Claim identifier.
        claim_id: ClaimId,
        /// Current status.
        from: ClaimStatus,
        /// Requested status.
        to: ClaimStatus,
    },
}

impl TaskDomainError {
    /// Returns `true` for malformed-field errors raised before any write.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyTitle
                | Self::TitleTooLong(_)
                | Self::EmptyDescription
                | Self::EmptyAddress
                | Self::InvalidRequiredVolunteers(_)
                | Self::InvalidPriorityLevel(_)
        )
    }

    /// Returns the failure category callers observe.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::NotClaimOwner { .. } => FailureKind::PermissionDenied,
            Self::ApprovalNotPending { .. }
            | Self::NotEditable { .. }
            | Self::NotDeletable { .. }
            | Self::InvalidClaimTransition { .. } => FailureKind::InvalidState,
            Self::EmptyTitle
            | Self::TitleTooLong(_)
            | Self::EmptyDescription
            | Self::EmptyAddress
            | Self::InvalidRequiredVolunteers(_)
            | Self::InvalidPriorityLevel(_) => FailureKind::Validation,
        }
    }
}

/// Error returned while parsing task enumerations from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseTaskValueError {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseTaskValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
