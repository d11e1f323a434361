//! Service layer for task creation, review, editing, and listing.

use crate::access::{
    domain::{AccessDenied, Actor, Capability},
    ports::AccessPolicy,
};
use crate::error::FailureKind;
use crate::events::{EventPublisher, ReliefEvent};
use crate::task::{
    domain::{
        ApprovalStatus, PriorityLevel, RequiredVolunteers, Task, TaskDetails, TaskDomainError,
        TaskId, TaskLocation, TaskPatch, TaskTitle, TaskType,
    },
    ports::{
        TaskQuery, TaskReferences, TaskRepository, TaskRepositoryError, TaskStatistics,
        TaskVisibility,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    task_type: TaskType,
    address: String,
    location_details: Option<String>,
    required_volunteers: u32,
    required_skills: Vec<String>,
    deadline: Option<DateTime<Utc>>,
    priority: u8,
}

impl CreateTaskRequest {
    /// Creates a request for a single-volunteer, lowest-priority task.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        task_type: TaskType,
        address: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            task_type,
            address: address.into(),
            location_details: None,
            required_volunteers: 1,
            required_skills: Vec::new(),
            deadline: None,
            priority: PriorityLevel::LOWEST.value(),
        }
    }

    /// Sets directions to the location.
    #[must_use]
    pub fn with_location_details(mut self, details: impl Into<String>) -> Self {
        self.location_details = Some(details.into());
        self
    }

    /// Sets the number of volunteers needed.
    #[must_use]
    pub const fn with_required_volunteers(mut self, count: u32) -> Self {
        self.required_volunteers = count;
        self
    }

    /// Sets the required skills.
    #[must_use]
    pub fn with_required_skills(mut self, skills: impl IntoIterator<Item = String>) -> Self {
        self.required_skills = skills.into_iter().collect();
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the priority level.
    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    fn into_details(self) -> Result<TaskDetails, TaskDomainError> {
        let mut location = TaskLocation::new(self.address)?;
        if let Some(directions) = self.location_details {
            location = location.with_details(directions);
        }
        let mut details = TaskDetails::new(
            TaskTitle::new(self.title)?,
            self.description,
            self.task_type,
            location,
        )?;
        details.required_volunteers = RequiredVolunteers::new(self.required_volunteers)?;
        details.required_skills = self.required_skills;
        details.deadline = self.deadline;
        details.priority = PriorityLevel::new(self.priority)?;
        Ok(details)
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// The actor lacks a required capability.
    #[error(transparent)]
    PermissionDenied(#[from] AccessDenied),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// Domain validation or transition failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

impl TaskLifecycleError {
    /// Returns the failure category callers observe.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::PermissionDenied(_) => FailureKind::PermissionDenied,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Domain(err) => err.failure_kind(),
            Self::Repository(err) => err.failure_kind(),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    references: Vec<Arc<dyn TaskReferences>>,
    policy: Arc<dyn AccessPolicy>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<C>,
}

impl<R, C> Clone for TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            references: self.references.clone(),
            policy: Arc::clone(&self.policy),
            events: Arc::clone(&self.events),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        policy: Arc<dyn AccessPolicy>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            references: Vec::new(),
            policy,
            events,
            clock,
        }
    }

    /// Adds a source of records that block deletion while they point at a
    /// task.
    #[must_use]
    pub fn with_references(mut self, references: Arc<dyn TaskReferences>) -> Self {
        self.references.push(references);
        self
    }

    /// Creates a task.
    ///
    /// Creators allowed to publish directly get an approved, available task;
    /// everyone else gets a pending task that needs review.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::PermissionDenied`] when the actor may
    /// not create tasks, [`TaskLifecycleError::Domain`] when a field is
    /// invalid, or [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn create(
        &self,
        request: CreateTaskRequest,
        actor: &Actor,
    ) -> TaskLifecycleResult<Task> {
        self.policy.authorize(actor, Capability::CreateTask)?;
        let details = request.into_details()?;
        let publish_directly = self.policy.allows(actor, Capability::PublishTaskDirectly);

        let task = Task::new(actor.id(), details, publish_directly, &*self.clock);
        self.repository.store(&task).await?;
        info!(
            task_id = %task.id(),
            creator_id = %actor.id(),
            status = %task.status(),
            "task created"
        );

        if !publish_directly {
            self.events.publish(&ReliefEvent::TaskApprovalRequested {
                task_id: task.id(),
                creator_id: actor.id(),
            });
        }
        Ok(task)
    }

    /// Approves or rejects a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] with
    /// [`TaskDomainError::ApprovalNotPending`] when the task was already
    /// reviewed. Approval is not idempotent.
    pub async fn approve(
        &self,
        task_id: TaskId,
        actor: &Actor,
        approved: bool,
        notes: Option<String>,
    ) -> TaskLifecycleResult<Task> {
        self.policy.authorize(actor, Capability::ApproveTask)?;
        let mut task = self.load(task_id).await?;
        let observed = task.status();

        task.review_decision(actor.id(), approved, notes, &*self.clock)?;
        self.repository.update_unclaimed(&task, observed).await?;
        info!(%task_id, approver_id = %actor.id(), approved, "task reviewed");

        let creator_id = task.creator_id();
        let approver_id = actor.id();
        self.events.publish(&if approved {
            ReliefEvent::TaskApproved {
                task_id,
                approver_id,
                creator_id,
            }
        } else {
            ReliefEvent::TaskRejected {
                task_id,
                approver_id,
                creator_id,
            }
        });
        Ok(task)
    }

    /// Edits an available task that nobody has claimed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::PermissionDenied`] unless the actor
    /// created the task or manages all tasks; returns an invalid-state
    /// failure when the task is not available or has claims.
    pub async fn update(
        &self,
        task_id: TaskId,
        patch: TaskPatch,
        actor: &Actor,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.load(task_id).await?;
        self.ensure_manager(&task, actor)?;
        task.ensure_editable()?;
        let observed = task.status();

        let details = patch.apply_to(task.details())?;
        task.replace_details(details, &*self.clock)?;
        self.repository.update_unclaimed(&task, observed).await?;
        info!(%task_id, editor_id = %actor.id(), "task updated");
        Ok(task)
    }

    /// Deletes a task that nobody has claimed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::PermissionDenied`] unless the actor
    /// created the task or manages all tasks; returns an invalid-state
    /// failure while volunteers hold slots, any claim exists, or a need
    /// assignment references the task.
    pub async fn delete(&self, task_id: TaskId, actor: &Actor) -> TaskLifecycleResult<()> {
        let task = self.load(task_id).await?;
        self.ensure_manager(&task, actor)?;
        task.ensure_deletable()?;
        for source in &self.references {
            if source.is_task_referenced(task_id).await? {
                return Err(TaskRepositoryError::Referenced(task_id).into());
            }
        }

        self.repository
            .delete_unclaimed(task_id, task.status())
            .await?;
        info!(%task_id, deleted_by = %actor.id(), "task deleted");
        Ok(())
    }

    /// Finds a task the actor may see.
    ///
    /// Returns `Ok(None)` when the task does not exist or is hidden from the
    /// actor.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn find(&self, task_id: TaskId, actor: &Actor) -> TaskLifecycleResult<Option<Task>> {
        let task = self.repository.find_by_id(task_id).await?;
        let can_view_all = self.policy.allows(actor, Capability::ViewAllTasks);
        Ok(task.filter(|found| {
            can_view_all
                || actor.is(found.creator_id())
                || found.approval_status() == ApprovalStatus::Approved
        }))
    }

    /// Lists tasks visible to the actor, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn list(&self, query: TaskQuery, actor: &Actor) -> TaskLifecycleResult<Vec<Task>> {
        let can_view_all = self.policy.allows(actor, Capability::ViewAllTasks);
        let visibility = match query.visibility {
            TaskVisibility::PublishedOnly => TaskVisibility::PublishedOnly,
            _ if can_view_all => query.visibility,
            _ => TaskVisibility::PublishedOrCreatedBy(actor.id()),
        };
        let scoped = TaskQuery {
            visibility,
            ..query
        };
        Ok(self.repository.list(&scoped).await?)
    }

    /// Lists approved tasks that are open for claims.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn list_available(&self) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.list(&TaskQuery::available()).await?)
    }

    /// Returns aggregate task counts.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn statistics(&self) -> TaskLifecycleResult<TaskStatistics> {
        Ok(self.repository.statistics().await?)
    }

    async fn load(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    fn ensure_manager(&self, task: &Task, actor: &Actor) -> TaskLifecycleResult<()> {
        if actor.is(task.creator_id()) {
            return Ok(());
        }
        Ok(self.policy.authorize(actor, Capability::ManageAnyTask)?)
    }
}

