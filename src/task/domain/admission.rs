//! Pure claim admission evaluation.
//!
//! [`ConflictReport::evaluate`] is the single decision procedure for claim
//! admission. It runs twice per claim: once as an advisory pre-flight
//! against a non-locking read, and again inside the committing transaction
//! against a snapshot read under the task lock. Only the second evaluation
//! is authoritative.

use super::{RequiredVolunteers, TaskId, TaskStatus};
use crate::access::domain::UserId;
use crate::error::FailureKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Limits applied during admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRules {
    /// Largest number of active claims one user may hold across all tasks.
    pub max_active_claims_per_user: u32,
}

impl Default for AdmissionRules {
    fn default() -> Self {
        Self {
            max_active_claims_per_user: 3,
        }
    }
}

/// Task fields that admission depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionTaskState {
    /// Current task status.
    pub status: TaskStatus,
    /// Capacity of the task.
    pub capacity: RequiredVolunteers,
}

/// Everything admission reads, captured at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionSnapshot {
    /// Task under consideration.
    pub task_id: TaskId,
    /// Claiming user.
    pub user_id: UserId,
    /// Task state, or `None` when the task does not exist.
    pub task: Option<AdmissionTaskState>,
    /// Active claims on the task.
    pub active_on_task: u32,
    /// Whether the user already holds an active claim on the task.
    pub user_holds_claim: bool,
    /// Active claims the user holds across all tasks.
    pub active_for_user: u32,
}

/// One reason a claim cannot be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ConflictReason {
    /// The task does not exist.
    TaskNotFound,
    /// The task is not open for claims.
    NotClaimable {
        /// Current task status.
        status: TaskStatus,
    },
    /// The user already holds an active claim on the task.
    AlreadyClaimed,
    /// Every slot is taken.
    CapacityFull {
        /// Active claims on the task.
        active: u32,
        /// Capacity of the task.
        capacity: u32,
    },
    /// The user reached the system-wide active-claim limit.
    TooManyActiveClaims {
        /// Active claims the user holds.
        active: u32,
        /// Configured limit.
        limit: u32,
    },
}

impl ConflictReason {
    /// Returns the failure kind a caller observes for this reason alone.
    #[must_use]
    pub const fn failure_kind(self) -> FailureKind {
        match self {
            Self::TaskNotFound => FailureKind::NotFound,
            Self::NotClaimable { .. } => FailureKind::InvalidState,
            Self::AlreadyClaimed => FailureKind::AlreadyClaimed,
            Self::CapacityFull { .. } | Self::TooManyActiveClaims { .. } => {
                FailureKind::CapacityExceeded
            }
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskNotFound => f.write_str("task not found"),
            Self::NotClaimable { status } => {
                write!(f, "task is not available for claiming (status: {status})")
            }
            Self::AlreadyClaimed => f.write_str("you have already claimed this task"),
            Self::CapacityFull { active, capacity } => {
                write!(f, "task has reached capacity ({active}/{capacity})")
            }
            Self::TooManyActiveClaims { active, limit } => {
                write!(f, "too many active claims ({active}/{limit})")
            }
        }
    }
}

/// Outcome of evaluating a claim against an [`AdmissionSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    task_id: TaskId,
    user_id: UserId,
    reasons: Vec<ConflictReason>,
}

impl ConflictReport {
    /// Evaluates every admission rule against the snapshot.
    ///
    /// Reasons are reported in a fixed order; a missing task stops
    /// evaluation because nothing else can be checked.
    #[must_use]
    pub fn evaluate(snapshot: &AdmissionSnapshot, rules: AdmissionRules) -> Self {
        let mut reasons = Vec::new();
        match snapshot.task {
            None => reasons.push(ConflictReason::TaskNotFound),
            Some(task) => {
                if task.status != TaskStatus::Available {
                    reasons.push(ConflictReason::NotClaimable {
                        status: task.status,
                    });
                }
                if snapshot.user_holds_claim {
                    reasons.push(ConflictReason::AlreadyClaimed);
                }
                if task.capacity.is_filled_by(snapshot.active_on_task) {
                    reasons.push(ConflictReason::CapacityFull {
                        active: snapshot.active_on_task,
                        capacity: task.capacity.value(),
                    });
                }
                if snapshot.active_for_user >= rules.max_active_claims_per_user {
                    reasons.push(ConflictReason::TooManyActiveClaims {
                        active: snapshot.active_for_user,
                        limit: rules.max_active_claims_per_user,
                    });
                }
            }
        }

        Self {
            task_id: snapshot.task_id,
            user_id: snapshot.user_id,
            reasons,
        }
    }

    /// Returns the evaluated task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the evaluated user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns `true` when admission would be refused.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.reasons.is_empty()
    }

    /// Returns the reasons in evaluation order.
    #[must_use]
    pub fn reasons(&self) -> &[ConflictReason] {
        &self.reasons
    }

    /// Returns the failure kind callers observe, or `None` when admissible.
    ///
    /// Precedence is not found, then already claimed, then state, then
    /// capacity. A task whose status left `available` because its slots are
    /// taken reports `CapacityExceeded`, so losing racers see a capacity
    /// failure; any other unclaimable status reports `InvalidState` even when
    /// the per-user limit is also reached.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.reasons
            .iter()
            .copied()
            .min_by_key(|reason| self.rank(*reason))
            .map(|reason| self.effective_kind(reason))
    }

    fn is_full(&self) -> bool {
        self.reasons
            .iter()
            .any(|reason| matches!(reason, ConflictReason::CapacityFull { .. }))
    }

    const fn occupied_status(reason: ConflictReason) -> bool {
        matches!(reason, ConflictReason::NotClaimable { status } if status.is_occupied())
    }

    fn effective_kind(&self, reason: ConflictReason) -> FailureKind {
        if Self::occupied_status(reason) && self.is_full() {
            FailureKind::CapacityExceeded
        } else {
            reason.failure_kind()
        }
    }

    fn rank(&self, reason: ConflictReason) -> u8 {
        match reason {
            ConflictReason::TaskNotFound => 0,
            ConflictReason::AlreadyClaimed => 1,
            ConflictReason::NotClaimable { .. }
                if Self::occupied_status(reason) && self.is_full() =>
            {
                2
            }
            ConflictReason::NotClaimable { .. } => 3,
            ConflictReason::CapacityFull { .. } => 4,
            ConflictReason::TooManyActiveClaims { .. } => 5,
        }
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reasons.is_empty() {
            return f.write_str("no conflicts");
        }
        for (index, reason) in self.reasons.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{reason}")?;
        }
        Ok(())
    }
}
