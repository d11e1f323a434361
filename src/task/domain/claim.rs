//! A volunteer's claim on one slot of a task.

use super::{ClaimId, ParseTaskValueError, TaskDomainError, TaskId};
use crate::access::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claim lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Slot reserved.
    Claimed,
    /// Work has begun.
    Started,
    /// Work is done.
    Completed,
    /// Slot released.
    Cancelled,
}

impl ClaimStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Claimed,
        Self::Started,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Claimed => "claimed",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when the claim occupies a slot.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Claimed | Self::Started)
    }

    /// Returns `true` when no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns `true` when the state machine allows moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Claimed, Self::Started | Self::Cancelled)
                | (Self::Started, Self::Completed | Self::Cancelled)
        )
    }
}

impl TryFrom<&str> for ClaimStatus {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseTaskValueError::new("claim status", value))
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's commitment to fill one unit of a task's capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    id: ClaimId,
    task_id: TaskId,
    user_id: UserId,
    status: ClaimStatus,
    notes: Option<String>,
    claimed_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedClaimData {
    /// Persisted claim identifier.
    pub id: ClaimId,
    /// Parent task.
    pub task_id: TaskId,
    /// Claiming user.
    pub user_id: UserId,
    /// Persisted status.
    pub status: ClaimStatus,
    /// Persisted notes.
    pub notes: Option<String>,
    /// When the slot was reserved.
    pub claimed_at: DateTime<Utc>,
    /// When work started.
    pub started_at: Option<DateTime<Utc>>,
    /// When work completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the slot was released.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a claim in the `claimed` state.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        user_id: UserId,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ClaimId::new(),
            task_id,
            user_id,
            status: ClaimStatus::Claimed,
            notes,
            claimed_at: timestamp,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a claim from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedClaimData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            user_id: data.user_id,
            status: data.status,
            notes: data.notes,
            claimed_at: data.claimed_at,
            started_at: data.started_at,
            completed_at: data.completed_at,
            cancelled_at: data.cancelled_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the claim identifier.
    #[must_use]
    pub const fn id(&self) -> ClaimId {
        self.id
    }

    /// Returns the parent task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the claiming user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> ClaimStatus {
        self.status
    }

    /// Returns the notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns when the slot was reserved.
    #[must_use]
    pub const fn claimed_at(&self) -> DateTime<Utc> {
        self.claimed_at
    }

    /// Returns when work started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when work completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns when the slot was released.
    #[must_use]
    pub const fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the claim occupies a slot.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Moves the claim to `target` on behalf of `actor`.
    ///
    /// Supplied notes replace the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotClaimOwner`] when `actor` does not own
    /// the claim, or [`TaskDomainError::InvalidClaimTransition`] when the
    /// state machine forbids the move.
    pub fn transition(
        &mut self,
        target: ClaimStatus,
        actor: UserId,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if actor != self.user_id {
            return Err(TaskDomainError::NotClaimOwner {
                claim_id: self.id,
                user_id: actor,
            });
        }
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidClaimTransition {
                claim_id: self.id,
                from: self.status,
                to: target,
            });
        }

        let timestamp = clock.utc();
        match target {
            ClaimStatus::Started => self.started_at = Some(timestamp),
            ClaimStatus::Completed => self.completed_at = Some(timestamp),
            ClaimStatus::Cancelled => self.cancelled_at = Some(timestamp),
            ClaimStatus::Claimed => {}
        }
        if notes.is_some() {
            self.notes = notes;
        }
        self.status = target;
        self.updated_at = timestamp;
        Ok(())
    }
}

/// Per-status claim counts for one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimTally {
    /// Claims in `claimed` or `started`.
    pub active: u32,
    /// Claims in `completed`.
    pub completed: u32,
    /// Claims in `cancelled`.
    pub cancelled: u32,
}

impl ClaimTally {
    /// Counts a set of claim statuses.
    pub fn from_statuses(statuses: impl IntoIterator<Item = ClaimStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut tally, status| {
            match status {
                ClaimStatus::Claimed | ClaimStatus::Started => tally.active += 1,
                ClaimStatus::Completed => tally.completed += 1,
                ClaimStatus::Cancelled => tally.cancelled += 1,
            }
            tally
        })
    }

    /// Total number of claims ever made on the task.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.active + self.completed + self.cancelled
    }

    /// Returns `true` when at least one claim completed and every
    /// non-cancelled claim has.
    #[must_use]
    pub const fn all_settled_completed(&self) -> bool {
        self.completed > 0 && self.active == 0
    }
}
