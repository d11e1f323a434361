//! Need reporting, assignment, and resolution.

use crate::access::{
    domain::{AccessDenied, Actor, Capability, UserId},
    ports::{AccessPolicy, UserDirectory, UserDirectoryError},
};
use crate::error::FailureKind;
use crate::events::{EventPublisher, ReliefEvent};
use crate::need::{
    domain::{
        Assignment, Need, NeedContent, NeedDomainError, NeedId, NeedType, Resolution,
        UrgencyLevel,
    },
    ports::{NeedQuery, NeedRepository, NeedRepositoryError, NeedStatistics, NeedVisibility},
};
use crate::task::{
    domain::TaskId,
    ports::{TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for reporting a need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNeedRequest {
    title: String,
    description: String,
    need_type: NeedType,
    address: String,
    urgency: u8,
}

impl CreateNeedRequest {
    /// Creates a request at the lowest urgency.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        need_type: NeedType,
        address: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            need_type,
            address: address.into(),
            urgency: UrgencyLevel::LOWEST.value(),
        }
    }

    /// Sets the urgency level.
    #[must_use]
    pub const fn with_urgency(mut self, urgency: u8) -> Self {
        self.urgency = urgency;
        self
    }

    fn into_content(self) -> Result<NeedContent, NeedDomainError> {
        NeedContent::new(
            self.title,
            self.description,
            self.need_type,
            self.address,
            UrgencyLevel::new(self.urgency)?,
        )
    }
}

/// Who a need is handed to, and through which task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedAssignmentRequest {
    assignee_id: UserId,
    task_id: Option<TaskId>,
    notes: Option<String>,
}

impl NeedAssignmentRequest {
    /// Creates a request handing the need to `assignee_id`.
    #[must_use]
    pub const fn new(assignee_id: UserId) -> Self {
        Self {
            assignee_id,
            task_id: None,
            notes: None,
        }
    }

    /// Links the assignment to a task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Attaches notes to the assignment record.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Service-level errors for need operations.
#[derive(Debug, Error)]
pub enum NeedLifecycleError {
    /// The actor lacks a required capability.
    #[error(transparent)]
    PermissionDenied(#[from] AccessDenied),
    /// The need does not exist.
    #[error("need not found: {0}")]
    NotFound(NeedId),
    /// The assignee is not a known user.
    #[error("assignee not found: {0}")]
    AssigneeNotFound(UserId),
    /// The task named by an assignment does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Domain validation or transition failed.
    #[error(transparent)]
    Domain(#[from] NeedDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] NeedRepositoryError),
    /// The user directory failed.
    #[error(transparent)]
    Directory(#[from] UserDirectoryError),
    /// Looking up a linked task failed.
    #[error("task lookup failed: {0}")]
    TaskLookup(#[source] TaskRepositoryError),
}

impl NeedLifecycleError {
    /// Returns the failure category callers observe.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::PermissionDenied(_) => FailureKind::PermissionDenied,
            Self::NotFound(_) | Self::AssigneeNotFound(_) | Self::TaskNotFound(_) => {
                FailureKind::NotFound
            }
            Self::Domain(err) => err.failure_kind(),
            Self::Repository(err) => err.failure_kind(),
            Self::TaskLookup(err) => err.failure_kind(),
            Self::Directory(_) => FailureKind::Infrastructure,
        }
    }
}

/// Result type for need service operations.
pub type NeedLifecycleResult<T> = Result<T, NeedLifecycleError>;

/// Need lifecycle and assignment coordination service.
///
/// Every mutation is one guarded write: the need row and any appended
/// assignment record commit together or not at all.
pub struct NeedLifecycleService<R, C>
where
    R: NeedRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<dyn UserDirectory>,
    tasks: Arc<dyn TaskRepository>,
    policy: Arc<dyn AccessPolicy>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<C>,
}

impl<R, C> Clone for NeedLifecycleService<R, C>
where
    R: NeedRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            directory: Arc::clone(&self.directory),
            tasks: Arc::clone(&self.tasks),
            policy: Arc::clone(&self.policy),
            events: Arc::clone(&self.events),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> NeedLifecycleService<R, C>
where
    R: NeedRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new need lifecycle service.
    ///
    /// `tasks` resolves the optional task an assignment is organised
    /// through.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        directory: Arc<dyn UserDirectory>,
        tasks: Arc<dyn TaskRepository>,
        policy: Arc<dyn AccessPolicy>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            directory,
            tasks,
            policy,
            events,
            clock,
        }
    }

    /// Reports a new open need.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::PermissionDenied`] when the actor may not
    /// report needs, or [`NeedLifecycleError::Domain`] when a field is
    /// invalid.
    pub async fn create(
        &self,
        request: CreateNeedRequest,
        actor: &Actor,
    ) -> NeedLifecycleResult<Need> {
        self.policy.authorize(actor, Capability::CreateNeed)?;
        let need = Need::new(actor.id(), request.into_content()?, &*self.clock);
        self.repository.store(&need).await?;
        info!(
            need_id = %need.id(),
            reporter_id = %actor.id(),
            urgency = %need.content().urgency(),
            "need reported"
        );
        Ok(need)
    }

    /// Hands an open need to an assignee.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::AssigneeNotFound`] for unknown users,
    /// [`NeedLifecycleError::TaskNotFound`] for an unknown linked task, and
    /// an invalid-state failure unless the need is open.
    pub async fn assign(
        &self,
        need_id: NeedId,
        request: NeedAssignmentRequest,
        actor: &Actor,
    ) -> NeedLifecycleResult<Need> {
        self.policy.authorize(actor, Capability::AssignNeed)?;
        self.ensure_known(request.assignee_id).await?;
        self.ensure_task(request.task_id).await?;
        let mut need = self.load(need_id).await?;
        let observed = need.revision();

        let record = need.assign(
            request.assignee_id,
            actor.id(),
            request.task_id,
            request.notes,
            &*self.clock,
        )?;
        self.repository
            .update(&need, observed, Some(&record))
            .await?;
        info!(%need_id, assignee_id = %record.assignee_id(), assigned_by = %actor.id(), "need assigned");
        self.publish_assigned(&record);
        Ok(need)
    }

    /// Returns a need to the open pool.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state failure for resolved or closed needs.
    pub async fn unassign(&self, need_id: NeedId, actor: &Actor) -> NeedLifecycleResult<Need> {
        self.policy.authorize(actor, Capability::AssignNeed)?;
        let mut need = self.load(need_id).await?;
        let observed = need.revision();

        need.unassign(&*self.clock)?;
        self.repository.update(&need, observed, None).await?;
        info!(%need_id, unassigned_by = %actor.id(), "need unassigned");
        Ok(need)
    }

    /// Replaces the assignee in a single write.
    ///
    /// Either the need ends up with the new assignee and a new audit record,
    /// or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::AssigneeNotFound`] for unknown users,
    /// [`NeedLifecycleError::TaskNotFound`] for an unknown linked task, and
    /// an invalid-state failure for resolved or closed needs.
    pub async fn reassign(
        &self,
        need_id: NeedId,
        request: NeedAssignmentRequest,
        actor: &Actor,
    ) -> NeedLifecycleResult<Need> {
        self.policy.authorize(actor, Capability::AssignNeed)?;
        self.ensure_known(request.assignee_id).await?;
        self.ensure_task(request.task_id).await?;
        let mut need = self.load(need_id).await?;
        let observed = need.revision();
        let previous = need.assigned_to();

        let record = need.reassign(
            request.assignee_id,
            actor.id(),
            request.task_id,
            request.notes,
            &*self.clock,
        )?;
        self.repository
            .update(&need, observed, Some(&record))
            .await?;
        info!(
            %need_id,
            previous_assignee = ?previous,
            assignee_id = %record.assignee_id(),
            "need reassigned"
        );
        self.publish_assigned(&record);
        Ok(need)
    }

    /// Starts work on an assigned need.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::PermissionDenied`] unless the actor is
    /// the assignee or manages needs, and an invalid-state failure unless the
    /// need is assigned.
    pub async fn start(
        &self,
        need_id: NeedId,
        actor: &Actor,
        notes: Option<String>,
    ) -> NeedLifecycleResult<Need> {
        let mut need = self.load(need_id).await?;
        if !need.is_assignee(actor.id()) {
            self.policy.authorize(actor, Capability::ManageAnyNeed)?;
        }
        let observed = need.revision();

        let record = need.start(actor.id(), notes, &*self.clock)?;
        self.repository
            .update(&need, observed, Some(&record))
            .await?;
        info!(%need_id, started_by = %actor.id(), "need in progress");
        Ok(need)
    }

    /// Marks a need as resolved.
    ///
    /// Resolving an already resolved need succeeds without changing it.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::PermissionDenied`] unless the actor is
    /// the assignee, the reporter, or manages needs; returns an invalid-state
    /// failure for closed needs.
    pub async fn resolve(
        &self,
        need_id: NeedId,
        actor: &Actor,
        notes: Option<String>,
    ) -> NeedLifecycleResult<Need> {
        let mut need = self.load(need_id).await?;
        if !need.is_assignee(actor.id()) && !actor.is(need.reporter_id()) {
            self.policy.authorize(actor, Capability::ManageAnyNeed)?;
        }
        let observed = need.revision();

        let assignment = match need.resolve(actor.id(), notes, &*self.clock)? {
            Resolution::AlreadyResolved => {
                debug!(%need_id, "need already resolved");
                return Ok(need);
            }
            Resolution::Resolved { assignment } => assignment,
        };
        self.repository
            .update(&need, observed, assignment.as_ref())
            .await?;
        info!(%need_id, resolved_by = %actor.id(), "need resolved");
        self.events.publish(&ReliefEvent::NeedResolved {
            need_id,
            reporter_id: need.reporter_id(),
            assignee_id: need.assigned_to(),
        });
        Ok(need)
    }

    /// Archives a resolved need.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::PermissionDenied`] unless the actor
    /// manages needs, and an invalid-state failure unless the need is
    /// resolved.
    pub async fn close(&self, need_id: NeedId, actor: &Actor) -> NeedLifecycleResult<Need> {
        self.policy.authorize(actor, Capability::ManageAnyNeed)?;
        let mut need = self.load(need_id).await?;
        let observed = need.revision();

        need.close(&*self.clock)?;
        self.repository.update(&need, observed, None).await?;
        info!(%need_id, closed_by = %actor.id(), "need closed");
        Ok(need)
    }

    /// Deletes a need that was never assigned.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::PermissionDenied`] unless the actor
    /// reported the need or may delete any need; returns an invalid-state
    /// failure once an assignment record exists.
    pub async fn delete(&self, need_id: NeedId, actor: &Actor) -> NeedLifecycleResult<()> {
        let need = self.load(need_id).await?;
        if !actor.is(need.reporter_id()) {
            self.policy.authorize(actor, Capability::DeleteAnyNeed)?;
        }
        self.repository.delete_unassigned(need_id).await?;
        info!(%need_id, deleted_by = %actor.id(), "need deleted");
        Ok(())
    }

    /// Finds a need the actor may see.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::Repository`] when the lookup fails.
    pub async fn find(&self, need_id: NeedId, actor: &Actor) -> NeedLifecycleResult<Option<Need>> {
        let scope = NeedQuery {
            visibility: self.visibility_for(actor, NeedVisibility::Everything),
            ..NeedQuery::default()
        };
        let need = self.repository.find_by_id(need_id).await?;
        Ok(need.filter(|found| scope.matches(found)))
    }

    /// Lists needs visible to the actor, most urgent first.
    ///
    /// Victims see the needs they reported; volunteers see open needs and
    /// needs assigned to them; coordinators see everything.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::Repository`] when the lookup fails.
    pub async fn list(&self, query: NeedQuery, actor: &Actor) -> NeedLifecycleResult<Vec<Need>> {
        let scoped = NeedQuery {
            visibility: self.visibility_for(actor, query.visibility),
            ..query
        };
        Ok(self.repository.list(&scoped).await?)
    }

    /// Returns a need's assignment audit trail, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::PermissionDenied`] unless the actor
    /// reported the need, is its assignee, or coordinates needs.
    pub async fn assignments(
        &self,
        need_id: NeedId,
        actor: &Actor,
    ) -> NeedLifecycleResult<Vec<Assignment>> {
        let need = self.load(need_id).await?;
        if !actor.is(need.reporter_id())
            && !need.is_assignee(actor.id())
            && !self.policy.allows(actor, Capability::ManageAnyNeed)
        {
            self.policy.authorize(actor, Capability::AssignNeed)?;
        }
        Ok(self.repository.assignments(need_id).await?)
    }

    /// Lists the assignment records naming a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::PermissionDenied`] unless the actor is
    /// that user or coordinates needs.
    pub async fn assignments_for_user(
        &self,
        user_id: UserId,
        actor: &Actor,
        limit: Option<usize>,
    ) -> NeedLifecycleResult<Vec<Assignment>> {
        if !actor.is(user_id) && !self.policy.allows(actor, Capability::ManageAnyNeed) {
            self.policy.authorize(actor, Capability::AssignNeed)?;
        }
        Ok(self.repository.assignments_for_user(user_id, limit).await?)
    }

    /// Returns aggregate need counts and the mean resolution time.
    ///
    /// # Errors
    ///
    /// Returns [`NeedLifecycleError::Repository`] when the lookup fails.
    pub async fn statistics(&self) -> NeedLifecycleResult<NeedStatistics> {
        Ok(self.repository.statistics().await?)
    }

    async fn load(&self, need_id: NeedId) -> NeedLifecycleResult<Need> {
        self.repository
            .find_by_id(need_id)
            .await?
            .ok_or(NeedLifecycleError::NotFound(need_id))
    }

    async fn ensure_known(&self, user_id: UserId) -> NeedLifecycleResult<()> {
        if self.directory.exists(user_id).await? {
            return Ok(());
        }
        Err(NeedLifecycleError::AssigneeNotFound(user_id))
    }

    async fn ensure_task(&self, task_id: Option<TaskId>) -> NeedLifecycleResult<()> {
        let Some(linked) = task_id else {
            return Ok(());
        };
        let found = self
            .tasks
            .find_by_id(linked)
            .await
            .map_err(NeedLifecycleError::TaskLookup)?;
        if found.is_none() {
            return Err(NeedLifecycleError::TaskNotFound(linked));
        }
        Ok(())
    }

    fn visibility_for(&self, actor: &Actor, requested: NeedVisibility) -> NeedVisibility {
        if self.policy.allows(actor, Capability::AssignNeed)
            || self.policy.allows(actor, Capability::ManageAnyNeed)
        {
            requested
        } else if self.policy.allows(actor, Capability::CreateNeed) {
            NeedVisibility::ReportedBy(actor.id())
        } else {
            NeedVisibility::OpenOrAssignedTo(actor.id())
        }
    }

    fn publish_assigned(&self, record: &Assignment) {
        self.events.publish(&ReliefEvent::NeedAssigned {
            need_id: record.need_id(),
            assignee_id: record.assignee_id(),
            assigned_by: record.recorded_by(),
        });
    }
}
