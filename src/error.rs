//! Failure classification shared by every service.
//!
//! Each service keeps its own error enum; [`FailureKind`] is the coarse
//! category an adapter (HTTP, CLI, queue consumer) maps to a response.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The actor's role lacks the required capability.
    PermissionDenied,
    /// A referenced entity does not exist.
    NotFound,
    /// The operation is not legal for the entity's current status.
    InvalidState,
    /// The task has no free slot left.
    CapacityExceeded,
    /// The user already holds an active claim on the task.
    AlreadyClaimed,
    /// A field failed validation before any write was attempted.
    Validation,
    /// Lock contention or a failed commit; the whole operation may be retried.
    RetryableConflict,
    /// The store failed for a reason unrelated to the request.
    Infrastructure,
}

impl FailureKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::AlreadyClaimed => "already_claimed",
            Self::Validation => "validation",
            Self::RetryableConflict => "retryable_conflict",
            Self::Infrastructure => "infrastructure",
        }
    }

    /// Returns `true` when repeating the same call may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RetryableConflict)
    }

    /// Returns `true` for expected business outcomes rather than faults.
    #[must_use]
    pub const fn is_business_outcome(self) -> bool {
        !matches!(self, Self::Infrastructure)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
