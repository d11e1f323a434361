//! Repository port for task persistence, listing, and guarded writes.

use crate::access::domain::UserId;
use crate::error::FailureKind;
use crate::task::domain::{
    ApprovalStatus, ClaimId, ClaimStatus, Task, TaskId, TaskStatus, TaskType,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository and claim ledger operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Which tasks a listing may reveal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskVisibility {
    /// Every task, including pending and rejected ones.
    Everything,
    /// Approved tasks plus any task created by the given user.
    PublishedOrCreatedBy(UserId),
    /// Approved tasks only.
    #[default]
    PublishedOnly,
}

/// Filters for task listings.
///
/// Results are ordered by priority (highest first), then newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Visibility restriction.
    pub visibility: TaskVisibility,
    /// Only tasks in this status.
    pub status: Option<TaskStatus>,
    /// Only tasks of this type.
    pub task_type: Option<TaskType>,
    /// Only tasks created by this user.
    pub creator_id: Option<UserId>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl TaskQuery {
    /// Query for tasks volunteers may claim right now.
    #[must_use]
    pub fn available() -> Self {
        Self {
            visibility: TaskVisibility::PublishedOnly,
            status: Some(TaskStatus::Available),
            ..Self::default()
        }
    }

    /// Returns `true` when the task passes every filter except `limit`.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let visible = match self.visibility {
            TaskVisibility::Everything => true,
            TaskVisibility::PublishedOrCreatedBy(user_id) => {
                task.approval_status() == ApprovalStatus::Approved
                    || task.creator_id() == user_id
            }
            TaskVisibility::PublishedOnly => {
                task.approval_status() == ApprovalStatus::Approved
            }
        };
        visible
            && self.status.is_none_or(|status| task.status() == status)
            && self
                .task_type
                .is_none_or(|task_type| task.details().task_type == task_type)
            && self
                .creator_id
                .is_none_or(|creator_id| task.creator_id() == creator_id)
    }
}

/// Aggregate counts over all tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStatistics {
    /// Number of tasks.
    pub total: u64,
    /// Tasks per status.
    pub by_status: BTreeMap<&'static str, u64>,
    /// Tasks per type.
    pub by_type: BTreeMap<&'static str, u64>,
    /// Tasks awaiting review.
    pub pending_approval: u64,
    /// Distinct users holding at least one active claim.
    pub active_volunteers: u64,
}

impl TaskStatistics {
    /// Returns the number of tasks in `status`.
    #[must_use]
    pub fn count_with_status(&self, status: TaskStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Lists tasks matching the query.
    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>>;

    /// Replaces a task that is still in `expected` status and has never been
    /// claimed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`],
    /// [`TaskRepositoryError::StaleState`] when the stored status differs from
    /// `expected`, or [`TaskRepositoryError::HasClaims`] when any claim
    /// references the task.
    async fn update_unclaimed(&self, task: &Task, expected: TaskStatus)
    -> TaskRepositoryResult<()>;

    /// Deletes a task that is still in `expected` status and has never been
    /// claimed.
    ///
    /// # Errors
    ///
    /// Same as [`TaskRepository::update_unclaimed`]; stores that enforce
    /// references also return [`TaskRepositoryError::Referenced`].
    async fn delete_unclaimed(&self, id: TaskId, expected: TaskStatus)
    -> TaskRepositoryResult<()>;

    /// Computes aggregate counts from a non-locking snapshot.
    async fn statistics(&self) -> TaskRepositoryResult<TaskStatistics>;
}

/// Errors returned by task repository and claim ledger implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The claim was not found.
    #[error("claim not found: {0}")]
    ClaimNotFound(ClaimId),

    /// The task changed status since it was read.
    #[error("task {task_id} is no longer in status {expected}")]
    StaleState {
        /// Task identifier.
        task_id: TaskId,
        /// Status the caller observed.
        expected: TaskStatus,
    },

    /// The task has claims and can no longer be edited or deleted.
    #[error("task {0} has claims")]
    HasClaims(TaskId),

    /// Other records reference the task, so it cannot be deleted.
    #[error("task {0} is referenced by need assignments")]
    Referenced(TaskId),

    /// The claim changed status since it was read.
    #[error("claim {claim_id} is no longer in status {expected}")]
    StaleClaim {
        /// Claim identifier.
        claim_id: ClaimId,
        /// Status the caller observed.
        expected: ClaimStatus,
    },

    /// A lock could not be acquired in time, or the transaction was
    /// serialized against a competing writer.
    #[error("contention on task {0}")]
    Contention(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns the failure category callers observe.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) | Self::ClaimNotFound(_) => FailureKind::NotFound,
            Self::StaleState { .. }
            | Self::HasClaims(_)
            | Self::Referenced(_)
            | Self::StaleClaim { .. } => FailureKind::InvalidState,
            Self::Contention(_) => FailureKind::RetryableConflict,
            Self::DuplicateTask(_) | Self::Persistence(_) => FailureKind::Infrastructure,
        }
    }
}
