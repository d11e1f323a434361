//! Need aggregate root and its lifecycle.

use super::{
    Assignment, AssignmentId, AssignmentStatus, NeedDomainError, NeedId, ParseNeedValueError,
    PersistedAssignmentData, UrgencyLevel,
};
use crate::access::domain::UserId;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Need lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedStatus {
    /// Reported and waiting for an assignee.
    Open,
    /// Handed to a responsible user.
    Assigned,
    /// The assignee is working on it.
    InProgress,
    /// The need was met.
    Resolved,
    /// Archived after resolution.
    Closed,
}

impl NeedStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Assigned,
        Self::InProgress,
        Self::Resolved,
        Self::Closed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` while the need still awaits resolution.
    #[must_use]
    pub const fn is_unresolved(self) -> bool {
        matches!(self, Self::Open | Self::Assigned | Self::InProgress)
    }
}

impl TryFrom<&str> for NeedStatus {
    type Error = ParseNeedValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseNeedValueError::new("need status", value))
    }
}

impl fmt::Display for NeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a reported need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedType {
    /// Food and drinking water.
    Food,
    /// Medical care or medicine.
    Medical,
    /// Somewhere to stay.
    Shelter,
    /// Clothing and bedding.
    Clothing,
    /// People trapped or at risk.
    Rescue,
    /// Debris and mud removal.
    Cleanup,
}

impl NeedType {
    /// Every need type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Food,
        Self::Medical,
        Self::Shelter,
        Self::Clothing,
        Self::Rescue,
        Self::Cleanup,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Medical => "medical",
            Self::Shelter => "shelter",
            Self::Clothing => "clothing",
            Self::Rescue => "rescue",
            Self::Cleanup => "cleanup",
        }
    }
}

impl TryFrom<&str> for NeedType {
    type Error = ParseNeedValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|need_type| need_type.as_str() == normalized)
            .ok_or_else(|| ParseNeedValueError::new("need type", value))
    }
}

impl fmt::Display for NeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle action, named in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeedAction {
    /// Hand an open need to an assignee.
    Assign,
    /// Return the need to the open pool.
    Unassign,
    /// Replace the assignee.
    Reassign,
    /// Begin work.
    Start,
    /// Mark the need as met.
    Resolve,
    /// Archive a resolved need.
    Close,
}

impl NeedAction {
    /// Returns the action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Unassign => "unassign",
            Self::Reassign => "reassign",
            Self::Start => "start",
            Self::Resolve => "resolve",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for NeedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporter-supplied description of a need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedContent {
    title: String,
    description: String,
    need_type: NeedType,
    address: String,
    urgency: UrgencyLevel,
}

impl NeedContent {
    const MAX_TITLE_CHARS: usize = 200;

    /// Validates and trims the reported fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or over-long title, an empty
    /// description, or an empty address.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        need_type: NeedType,
        address: impl Into<String>,
        urgency: UrgencyLevel,
    ) -> Result<Self, NeedDomainError> {
        let trimmed_title = non_empty(title.into(), NeedDomainError::EmptyTitle)?;
        let chars = trimmed_title.chars().count();
        if chars > Self::MAX_TITLE_CHARS {
            return Err(NeedDomainError::TitleTooLong(chars));
        }
        Ok(Self {
            title: trimmed_title,
            description: non_empty(description.into(), NeedDomainError::EmptyDescription)?,
            need_type,
            address: non_empty(address.into(), NeedDomainError::EmptyAddress)?,
            urgency,
        })
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the category.
    #[must_use]
    pub const fn need_type(&self) -> NeedType {
        self.need_type
    }

    /// Returns the address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the urgency.
    #[must_use]
    pub const fn urgency(&self) -> UrgencyLevel {
        self.urgency
    }
}

fn non_empty(raw: String, empty: NeedDomainError) -> Result<String, NeedDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    Ok(trimmed.to_owned())
}

/// Status and change time observed when a need was read.
///
/// Writes compare it against storage so concurrent changes are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeedRevision {
    /// Observed status.
    pub status: NeedStatus,
    /// Observed change timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Result of [`Need::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The need was already resolved; nothing changed.
    AlreadyResolved,
    /// The need moved to `resolved`.
    Resolved {
        /// Completion record, present when the need had an assignee.
        assignment: Option<Assignment>,
    },
}

/// A need reported by a victim and handled by at most one assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Need {
    id: NeedId,
    reporter_id: UserId,
    content: NeedContent,
    status: NeedStatus,
    assigned_to: Option<UserId>,
    assigned_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNeedData {
    /// Persisted identifier.
    pub id: NeedId,
    /// Reporting user.
    pub reporter_id: UserId,
    /// Reported content.
    pub content: NeedContent,
    /// Persisted status.
    pub status: NeedStatus,
    /// Current assignee.
    pub assigned_to: Option<UserId>,
    /// When the current assignee took over.
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the need was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Need {
    /// Creates an open need.
    #[must_use]
    pub fn new(reporter_id: UserId, content: NeedContent, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: NeedId::new(),
            reporter_id,
            content,
            status: NeedStatus::Open,
            assigned_to: None,
            assigned_at: None,
            resolved_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a need from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedNeedData) -> Self {
        Self {
            id: data.id,
            reporter_id: data.reporter_id,
            content: data.content,
            status: data.status,
            assigned_to: data.assigned_to,
            assigned_at: data.assigned_at,
            resolved_at: data.resolved_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> NeedId {
        self.id
    }

    /// Returns the reporting user.
    #[must_use]
    pub const fn reporter_id(&self) -> UserId {
        self.reporter_id
    }

    /// Returns the reported content.
    #[must_use]
    pub const fn content(&self) -> &NeedContent {
        &self.content
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> NeedStatus {
        self.status
    }

    /// Returns the current assignee.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns when the current assignee took over.
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns when the need was resolved.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
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

    /// Returns the state a guarded write must still find in storage.
    #[must_use]
    pub const fn revision(&self) -> NeedRevision {
        NeedRevision {
            status: self.status,
            updated_at: self.updated_at,
        }
    }

    /// Returns `true` when `user_id` is the current assignee.
    #[must_use]
    pub fn is_assignee(&self, user_id: UserId) -> bool {
        self.assigned_to == Some(user_id)
    }

    /// Hands an open need to `assignee_id` and returns the audit record.
    ///
    /// # Errors
    ///
    /// Returns [`NeedDomainError::InvalidTransition`] unless the need is
    /// open; use [`Need::reassign`] to replace an assignee.
    pub fn assign(
        &mut self,
        assignee_id: UserId,
        assigned_by: UserId,
        task_id: Option<TaskId>,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<Assignment, NeedDomainError> {
        self.require(NeedAction::Assign, self.status == NeedStatus::Open)?;
        let timestamp = clock.utc();
        self.status = NeedStatus::Assigned;
        self.assigned_to = Some(assignee_id);
        self.assigned_at = Some(timestamp);
        self.touch_at(timestamp);
        Ok(self.audit(assignee_id, assigned_by, task_id, AssignmentStatus::Assigned, notes))
    }

    /// Returns the need to the open pool and clears the assignee.
    ///
    /// # Errors
    ///
    /// Returns [`NeedDomainError::InvalidTransition`] for resolved or closed
    /// needs.
    pub fn unassign(&mut self, clock: &impl Clock) -> Result<(), NeedDomainError> {
        self.require(NeedAction::Unassign, self.status.is_unresolved())?;
        self.clear_assignee(clock.utc());
        Ok(())
    }

    /// Replaces the assignee in one step and returns the new audit record.
    ///
    /// # Errors
    ///
    /// Returns [`NeedDomainError::InvalidTransition`] for resolved or closed
    /// needs.
    pub fn reassign(
        &mut self,
        assignee_id: UserId,
        assigned_by: UserId,
        task_id: Option<TaskId>,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<Assignment, NeedDomainError> {
        self.require(NeedAction::Reassign, self.status.is_unresolved())?;
        self.clear_assignee(clock.utc());
        self.assign(assignee_id, assigned_by, task_id, notes, clock)
    }

    /// Moves an assigned need into progress.
    ///
    /// # Errors
    ///
    /// Returns [`NeedDomainError::InvalidTransition`] unless the need is
    /// assigned.
    pub fn start(
        &mut self,
        started_by: UserId,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<Assignment, NeedDomainError> {
        let assignee = self
            .assigned_to
            .filter(|_| self.status == NeedStatus::Assigned)
            .ok_or_else(|| self.invalid(NeedAction::Start))?;
        self.status = NeedStatus::InProgress;
        self.touch_at(clock.utc());
        Ok(self.audit(assignee, started_by, None, AssignmentStatus::InProgress, notes))
    }

    /// Marks the need as met.
    ///
    /// `resolved_at` is set only on the transition into `resolved`;
    /// resolving again changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`NeedDomainError::InvalidTransition`] for closed needs.
    pub fn resolve(
        &mut self,
        resolved_by: UserId,
        notes: Option<String>,
        clock: &impl Clock,
    ) -> Result<Resolution, NeedDomainError> {
        match self.status {
            NeedStatus::Resolved => return Ok(Resolution::AlreadyResolved),
            NeedStatus::Closed => return Err(self.invalid(NeedAction::Resolve)),
            NeedStatus::Open | NeedStatus::Assigned | NeedStatus::InProgress => {}
        }
        let timestamp = clock.utc();
        self.status = NeedStatus::Resolved;
        self.resolved_at = Some(timestamp);
        self.touch_at(timestamp);
        let assignment = self.assigned_to.map(|assignee| {
            self.audit(assignee, resolved_by, None, AssignmentStatus::Completed, notes)
        });
        Ok(Resolution::Resolved { assignment })
    }

    /// Archives a resolved need.
    ///
    /// # Errors
    ///
    /// Returns [`NeedDomainError::InvalidTransition`] unless the need is
    /// resolved.
    pub fn close(&mut self, clock: &impl Clock) -> Result<(), NeedDomainError> {
        self.require(NeedAction::Close, self.status == NeedStatus::Resolved)?;
        self.status = NeedStatus::Closed;
        self.touch_at(clock.utc());
        Ok(())
    }

    fn clear_assignee(&mut self, at: DateTime<Utc>) {
        self.status = NeedStatus::Open;
        self.assigned_to = None;
        self.assigned_at = None;
        self.touch_at(at);
    }

    fn audit(
        &self,
        assignee_id: UserId,
        recorded_by: UserId,
        task_id: Option<TaskId>,
        status: AssignmentStatus,
        notes: Option<String>,
    ) -> Assignment {
        Assignment::from_persisted(PersistedAssignmentData {
            id: AssignmentId::new(),
            need_id: self.id,
            task_id,
            assignee_id,
            recorded_by,
            status,
            notes,
            recorded_at: self.updated_at,
        })
    }

    const fn invalid(&self, action: NeedAction) -> NeedDomainError {
        NeedDomainError::InvalidTransition {
            need_id: self.id,
            action,
            status: self.status,
        }
    }

    const fn require(&self, action: NeedAction, allowed: bool) -> Result<(), NeedDomainError> {
        if allowed {
            return Ok(());
        }
        Err(self.invalid(action))
    }

    fn touch_at(&mut self, at: DateTime<Utc>) {
        if at > self.updated_at {
            self.updated_at = at;
        }
    }
}
