//! Append-only assignment records.

use super::{AssignmentId, NeedId, ParseNeedValueError};
use crate::access::domain::UserId;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status captured by an assignment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// The need was handed to the assignee.
    Assigned,
    /// The assignee started working on the need.
    InProgress,
    /// The need was resolved while assigned.
    Completed,
}

impl AssignmentStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 3] = [Self::Assigned, Self::InProgress, Self::Completed];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for AssignmentStatus {
    type Error = ParseNeedValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseNeedValueError::new("assignment status", value))
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a need's audit trail. Records are never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    need_id: NeedId,
    task_id: Option<TaskId>,
    assignee_id: UserId,
    recorded_by: UserId,
    status: AssignmentStatus,
    notes: Option<String>,
    recorded_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted assignment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAssignmentData {
    /// Record identifier.
    pub id: AssignmentId,
    /// Need the record belongs to.
    pub need_id: NeedId,
    /// Task the work is organised through, if any.
    pub task_id: Option<TaskId>,
    /// Responsible user.
    pub assignee_id: UserId,
    /// User whose action produced the record.
    pub recorded_by: UserId,
    /// Captured status.
    pub status: AssignmentStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

impl Assignment {
    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAssignmentData) -> Self {
        Self {
            id: data.id,
            need_id: data.need_id,
            task_id: data.task_id,
            assignee_id: data.assignee_id,
            recorded_by: data.recorded_by,
            status: data.status,
            notes: data.notes,
            recorded_at: data.recorded_at,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the need.
    #[must_use]
    pub const fn need_id(&self) -> NeedId {
        self.need_id
    }

    /// Returns the linked task.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the responsible user.
    #[must_use]
    pub const fn assignee_id(&self) -> UserId {
        self.assignee_id
    }

    /// Returns the user whose action produced the record.
    #[must_use]
    pub const fn recorded_by(&self) -> UserId {
        self.recorded_by
    }

    /// Returns the captured status.
    #[must_use]
    pub const fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns the notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns when the record was appended.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
