//! Claim admission and claim status transitions.

use super::ConflictChecker;
use crate::access::{
    domain::{AccessDenied, Actor, Capability, UserId},
    ports::AccessPolicy,
};
use crate::config::AdmissionConfig;
use crate::error::FailureKind;
use crate::events::{EventPublisher, ReliefEvent};
use crate::task::{
    domain::{Claim, ClaimId, ClaimStatus, ConflictReport, TaskDomainError, TaskId},
    ports::{
        AdmissionOutcome, AdmissionRequest, ClaimLedger, ClaimTransition, TaskRepository,
        TaskRepositoryError, TransitionOutcome,
    },
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for claim admission and claim transitions.
#[derive(Debug, Error)]
pub enum ClaimAdmissionError {
    /// The actor lacks a required capability.
    #[error(transparent)]
    PermissionDenied(#[from] AccessDenied),

    /// Admission was refused; the report lists every reason.
    #[error("claim refused: {0}")]
    Refused(ConflictReport),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The claim does not exist.
    #[error("claim not found: {0}")]
    ClaimNotFound(ClaimId),

    /// Lock contention or a failed commit; the whole claim may be retried.
    #[error("retryable conflict on task {task_id}: {source}")]
    RetryableConflict {
        /// Contended task.
        task_id: TaskId,
        /// Underlying store failure.
        #[source]
        source: TaskRepositoryError,
    },

    /// Domain rule failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

impl ClaimAdmissionError {
    /// Returns the failure category callers observe.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::PermissionDenied(_) => FailureKind::PermissionDenied,
            Self::Refused(report) => report.failure_kind().unwrap_or(FailureKind::InvalidState),
            Self::TaskNotFound(_) | Self::ClaimNotFound(_) => FailureKind::NotFound,
            Self::RetryableConflict { .. } => FailureKind::RetryableConflict,
            Self::Domain(err) => err.failure_kind(),
            Self::Repository(err) => err.failure_kind(),
        }
    }

    /// Returns `true` when repeating the whole call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns the conflict report for refused claims.
    #[must_use]
    pub const fn report(&self) -> Option<&ConflictReport> {
        match self {
            Self::Refused(report) => Some(report),
            _ => None,
        }
    }
}

/// Result type for claim admission service operations.
pub type ClaimAdmissionResult<T> = Result<T, ClaimAdmissionError>;

/// Admits claims against a task's fixed capacity and drives claim
/// transitions.
///
/// A claim is checked twice: once by [`ConflictChecker`] outside any lock to
/// fail fast, and again by the ledger's indivisible admit operation under
/// the task lock. Only the second check decides.
pub struct ClaimAdmissionService<S, C>
where
    S: TaskRepository + ClaimLedger,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    checker: ConflictChecker<S>,
    policy: Arc<dyn AccessPolicy>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<C>,
    config: AdmissionConfig,
}

impl<S, C> Clone for ClaimAdmissionService<S, C>
where
    S: TaskRepository + ClaimLedger,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            checker: self.checker.clone(),
            policy: Arc::clone(&self.policy),
            events: Arc::clone(&self.events),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S, C> ClaimAdmissionService<S, C>
where
    S: TaskRepository + ClaimLedger,
    C: Clock + Send + Sync,
{
    /// Creates a new claim admission service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        policy: Arc<dyn AccessPolicy>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<C>,
        config: AdmissionConfig,
    ) -> Self {
        let checker = ConflictChecker::new(Arc::clone(&store), config.rules());
        Self {
            store,
            checker,
            policy,
            events,
            clock,
            config,
        }
    }

    /// Returns the advisory conflict checker used for pre-flight checks.
    #[must_use]
    pub const fn checker(&self) -> &ConflictChecker<S> {
        &self.checker
    }

    /// Reports whether the user could claim the task right now.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimAdmissionError::Repository`] when the read fails.
    pub async fn check_conflicts(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> ClaimAdmissionResult<ConflictReport> {
        Ok(self.checker.check(task_id, user_id).await?)
    }

    /// Claims one slot on a task for the actor.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimAdmissionError::PermissionDenied`] when the actor may
    /// not claim tasks, [`ClaimAdmissionError::Refused`] when admission is
    /// refused (its [`ClaimAdmissionError::kind`] distinguishes capacity,
    /// duplicate, and state failures), or
    /// [`ClaimAdmissionError::RetryableConflict`] on lock timeout or commit
    /// failure.
    pub async fn claim(
        &self,
        task_id: TaskId,
        actor: &Actor,
        notes: Option<String>,
    ) -> ClaimAdmissionResult<Claim> {
        self.policy.authorize(actor, Capability::ClaimTask)?;

        let preflight = self.checker.check(task_id, actor.id()).await?;
        if preflight.has_conflicts() {
            debug!(%task_id, user_id = %actor.id(), reasons = %preflight, "claim refused before locking");
            return Err(ClaimAdmissionError::Refused(preflight));
        }

        let request = AdmissionRequest {
            candidate: Claim::new(task_id, actor.id(), notes, &*self.clock),
            rules: self.config.rules(),
            lock_timeout: self.config.lock_timeout(),
        };
        let outcome = self.store.admit(request).await.map_err(|err| match err {
            TaskRepositoryError::Contention(_) | TaskRepositoryError::Persistence(_) => {
                ClaimAdmissionError::RetryableConflict {
                    task_id,
                    source: err,
                }
            }
            other => ClaimAdmissionError::Repository(other),
        })?;

        match outcome {
            AdmissionOutcome::Admitted { claim, task } => {
                info!(
                    %task_id,
                    claim_id = %claim.id(),
                    user_id = %actor.id(),
                    task_status = %task.status(),
                    "claim admitted"
                );
                self.events.publish(&ReliefEvent::TaskClaimed {
                    task_id,
                    claim_id: claim.id(),
                    user_id: actor.id(),
                    creator_id: task.creator_id(),
                });
                Ok(claim)
            }
            AdmissionOutcome::Rejected(report) => {
                info!(%task_id, user_id = %actor.id(), reasons = %report, "claim refused under lock");
                Err(ClaimAdmissionError::Refused(report))
            }
        }
    }

    /// Claims a slot, re-running the whole admission sequence after
    /// retryable failures up to the configured number of attempts.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// non-retryable error.
    pub async fn claim_with_retry(
        &self,
        task_id: TaskId,
        actor: &Actor,
        notes: Option<String>,
    ) -> ClaimAdmissionResult<Claim> {
        let attempts = self.config.retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.claim(task_id, actor, notes.clone()).await {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(%task_id, user_id = %actor.id(), attempt, error = %err, "retrying claim");
                    tokio::time::sleep(Duration::from_millis(u64::from(attempt) * 10)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Moves a claim through its state machine on behalf of its owner and
    /// applies any resulting task cascade in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimAdmissionError::ClaimNotFound`],
    /// [`ClaimAdmissionError::Domain`] when the actor does not own the claim
    /// or the transition is illegal, or [`ClaimAdmissionError::Repository`]
    /// when the claim changed concurrently or the store fails.
    pub async fn update_claim_status(
        &self,
        claim_id: ClaimId,
        target: ClaimStatus,
        actor: &Actor,
        notes: Option<String>,
    ) -> ClaimAdmissionResult<TransitionOutcome> {
        let mut claim = self
            .store
            .find_claim(claim_id)
            .await?
            .ok_or(ClaimAdmissionError::ClaimNotFound(claim_id))?;
        let expected = claim.status();
        claim.transition(target, actor.id(), notes, &*self.clock)?;

        let outcome = self
            .store
            .apply_transition(ClaimTransition {
                claim,
                expected,
                reopen_on_release: self.config.reopen_on_release,
                lock_timeout: self.config.lock_timeout(),
            })
            .await?;
        let task_id = outcome.task.id();
        info!(%task_id, %claim_id, from = %expected, to = %target, "claim status updated");

        if target == ClaimStatus::Completed {
            self.events.publish(&ReliefEvent::ClaimCompleted {
                task_id,
                claim_id,
                user_id: actor.id(),
            });
        }
        if let Some(cascade) = outcome.cascade {
            info!(%task_id, cascade = cascade.as_str(), status = %outcome.task.status(), "task status cascaded");
            self.events
                .publish(&ReliefEvent::TaskStatusCascaded { task_id, cascade });
        }
        Ok(outcome)
    }

    /// Lists every claim on a task; visible to the creator and task
    /// managers.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimAdmissionError::TaskNotFound`] or
    /// [`ClaimAdmissionError::PermissionDenied`].
    pub async fn claims_for_task(
        &self,
        task_id: TaskId,
        actor: &Actor,
    ) -> ClaimAdmissionResult<Vec<Claim>> {
        let task = self
            .store
            .find_by_id(task_id)
            .await?
            .ok_or(ClaimAdmissionError::TaskNotFound(task_id))?;
        if !actor.is(task.creator_id()) {
            self.policy.authorize(actor, Capability::ManageAnyTask)?;
        }
        Ok(self.store.claims_for_task(task_id).await?)
    }

    /// Lists a user's claim history, newest first, optionally only claims
    /// in `status`.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimAdmissionError::Repository`] when the read fails.
    pub async fn claims_for_user(
        &self,
        user_id: UserId,
        status: Option<ClaimStatus>,
    ) -> ClaimAdmissionResult<Vec<Claim>> {
        Ok(self.store.claims_for_user(user_id, status).await?)
    }
}
