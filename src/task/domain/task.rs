//! Task aggregate root and related lifecycle types.

use super::{
    ClaimStatus, ClaimTally, ParseTaskValueError, RequiredVolunteers, TaskDetails,
    TaskDomainError, TaskId,
};
use crate::access::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Awaiting approval.
    Pending,
    /// Open for claims.
    Available,
    /// Every slot is claimed.
    Claimed,
    /// Work has started on a fully claimed task.
    InProgress,
    /// All claims were completed.
    Completed,
    /// Rejected or withdrawn.
    Cancelled,
}

impl TaskStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Available,
        Self::Claimed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Available => "available",
            Self::Claimed => "claimed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when the status only exists for approved tasks.
    #[must_use]
    pub const fn requires_approval(self) -> bool {
        matches!(
            self,
            Self::Available | Self::Claimed | Self::InProgress | Self::Completed
        )
    }

    /// Returns `true` while volunteers hold the task's slots.
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        matches!(self, Self::Claimed | Self::InProgress)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseTaskValueError::new("task status", value))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting review.
    Pending,
    /// Published.
    Approved,
    /// Refused by a reviewer.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ApprovalStatus {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseTaskValueError::new("approval status", value)),
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task status change caused by a claim transition rather than by a
/// direct task operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCascade {
    /// Work began on a fully claimed task.
    Started,
    /// Every remaining claim was completed.
    Completed,
    /// A released slot made a full task claimable again.
    Reopened,
}

impl TaskCascade {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Reopened => "reopened",
        }
    }

    /// Returns the status the task moves to.
    #[must_use]
    pub const fn target(self) -> TaskStatus {
        match self {
            Self::Started => TaskStatus::InProgress,
            Self::Completed => TaskStatus::Completed,
            Self::Reopened => TaskStatus::Available,
        }
    }
}

/// Review record for an approved or rejected task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReview {
    /// Reviewer.
    pub reviewer_id: UserId,
    /// Review time.
    pub reviewed_at: DateTime<Utc>,
    /// Reviewer's remarks.
    pub notes: Option<String>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    creator_id: UserId,
    details: TaskDetails,
    status: TaskStatus,
    approval_status: ApprovalStatus,
    review: Option<TaskReview>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted creator.
    pub creator_id: UserId,
    /// Persisted content.
    pub details: TaskDetails,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted review state.
    pub approval_status: ApprovalStatus,
    /// Persisted review record, if reviewed.
    pub review: Option<TaskReview>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task.
    ///
    /// Tasks from creators allowed to publish directly start approved and
    /// available; all others start pending review.
    #[must_use]
    pub fn new(
        creator_id: UserId,
        details: TaskDetails,
        publish_directly: bool,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        let (status, approval_status) = if publish_directly {
            (TaskStatus::Available, ApprovalStatus::Approved)
        } else {
            (TaskStatus::Pending, ApprovalStatus::Pending)
        };

        Self {
            id: TaskId::new(),
            creator_id,
            details,
            status,
            approval_status,
            review: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            creator_id: data.creator_id,
            details: data.details,
            status: data.status,
            approval_status: data.approval_status,
            review: data.review,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the creator.
    #[must_use]
    pub const fn creator_id(&self) -> UserId {
        self.creator_id
    }

    /// Returns the task content.
    #[must_use]
    pub const fn details(&self) -> &TaskDetails {
        &self.details
    }

    /// Returns the admission capacity.
    #[must_use]
    pub const fn capacity(&self) -> RequiredVolunteers {
        self.details.required_volunteers
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the review state.
    #[must_use]
    pub const fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }

    /// Returns the review record, if the task was reviewed.
    #[must_use]
    pub const fn review(&self) -> Option<&TaskReview> {
        self.review.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the task may currently accept claims.
    #[must_use]
    pub fn is_open_for_claims(&self) -> bool {
        self.status == TaskStatus::Available && self.approval_status == ApprovalStatus::Approved
    }

    /// Returns `true` when the status is consistent with the review state.
    #[must_use]
    pub fn satisfies_approval_invariant(&self) -> bool {
        !self.status.requires_approval() || self.approval_status == ApprovalStatus::Approved
    }

    /// Records a review decision.
    ///
    /// Approval moves the task to `approved/available`; rejection moves it to
    /// `rejected/cancelled`. Reviewing twice is an error, not a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ApprovalNotPending`] unless the task is
    /// awaiting review.
    pub fn review_decision(
        &mut self,
        reviewer_id: UserId,
        approved: bool,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.approval_status != ApprovalStatus::Pending {
            return Err(TaskDomainError::ApprovalNotPending {
                task_id: self.id,
                approval_status: self.approval_status,
            });
        }
        let reviewed_at = clock.utc();
        (self.approval_status, self.status) = if approved {
            (ApprovalStatus::Approved, TaskStatus::Available)
        } else {
            (ApprovalStatus::Rejected, TaskStatus::Cancelled)
        };
        self.review = Some(TaskReview {
            reviewer_id,
            reviewed_at,
            notes,
        });
        self.updated_at = reviewed_at;
        Ok(())
    }

    /// Checks that the task content may still be edited.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotEditable`] unless the task is available.
    pub fn ensure_editable(&self) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Available {
            return Err(TaskDomainError::NotEditable {
                task_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Replaces the task content after an edit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotEditable`] unless the task is available.
    pub fn replace_details(
        &mut self,
        details: TaskDetails,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_editable()?;
        self.details = details;
        self.touch_at(clock.utc());
        Ok(())
    }

    /// Checks that the task may be deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotDeletable`] while volunteers hold slots.
    pub fn ensure_deletable(&self) -> Result<(), TaskDomainError> {
        if self.status.is_occupied() {
            return Err(TaskDomainError::NotDeletable {
                task_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Records an admitted claim; the task becomes `claimed` once
    /// `active_after` fills its capacity.
    ///
    /// Returns `true` when the status changed.
    pub fn record_admission(&mut self, active_after: u32, at: DateTime<Utc>) -> bool {
        self.touch_at(at);
        if self.status == TaskStatus::Available && self.capacity().is_filled_by(active_after) {
            self.status = TaskStatus::Claimed;
            return true;
        }
        false
    }

    /// Decides which cascade, if any, a claim transition triggers.
    #[must_use]
    pub fn cascade_for(
        &self,
        trigger: ClaimStatus,
        tally: &ClaimTally,
        reopen_on_release: bool,
    ) -> Option<TaskCascade> {
        match trigger {
            ClaimStatus::Completed
                if tally.all_settled_completed()
                    && !matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled) =>
            {
                Some(TaskCascade::Completed)
            }
            ClaimStatus::Started if self.status == TaskStatus::Claimed => Some(TaskCascade::Started),
            ClaimStatus::Cancelled
                if reopen_on_release
                    && self.status.is_occupied()
                    && !self.capacity().is_filled_by(tally.active) =>
            {
                Some(TaskCascade::Reopened)
            }
            _ => None,
        }
    }

    /// Applies the cascade a claim transition triggers and returns it.
    pub fn settle_claims(
        &mut self,
        trigger: ClaimStatus,
        tally: &ClaimTally,
        reopen_on_release: bool,
        at: DateTime<Utc>,
    ) -> Option<TaskCascade> {
        let cascade = self.cascade_for(trigger, tally, reopen_on_release)?;
        self.status = cascade.target();
        self.touch_at(at);
        Some(cascade)
    }

    fn touch_at(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}
