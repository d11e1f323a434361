//! Claim ledger port: the transactional boundary for claim admission and
//! claim transitions.

use super::TaskRepositoryResult;
use crate::access::domain::UserId;
use crate::task::domain::{
    AdmissionRules, AdmissionSnapshot, Claim, ClaimId, ClaimStatus, ConflictReport, Task,
    TaskCascade, TaskId,
};
use async_trait::async_trait;
use std::time::Duration;

/// Input to [`ClaimLedger::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Claim to insert if admitted; carries the task and user.
    pub candidate: Claim,
    /// Limits re-evaluated under the lock.
    pub rules: AdmissionRules,
    /// Longest wait for the task and user locks.
    pub lock_timeout: Duration,
}

/// Result of [`ClaimLedger::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The claim was inserted and the transaction committed.
    Admitted {
        /// Stored claim.
        claim: Claim,
        /// Task as written by the same transaction.
        task: Task,
    },
    /// Re-evaluation under the lock refused the claim; nothing was written.
    Rejected(ConflictReport),
}

/// Input to [`ClaimLedger::apply_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTransition {
    /// Claim after the domain transition.
    pub claim: Claim,
    /// Status the claim had when it was read.
    pub expected: ClaimStatus,
    /// Whether a released slot reopens an occupied task.
    pub reopen_on_release: bool,
    /// Longest wait for the task lock.
    pub lock_timeout: Duration,
}

/// Result of [`ClaimLedger::apply_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Stored claim.
    pub claim: Claim,
    /// Parent task after any cascade.
    pub task: Task,
    /// Cascade applied in the same transaction, if any.
    pub cascade: Option<TaskCascade>,
}

/// Claim persistence contract.
///
/// Implementations serialize every write touching one task's claims behind
/// that task's lock, and take the claiming user's lock second.
#[async_trait]
pub trait ClaimLedger: Send + Sync {
    /// Reads admission inputs without locking.
    async fn admission_snapshot(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskRepositoryResult<AdmissionSnapshot>;

    /// Validates a claim under lock and inserts it as one indivisible
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskRepositoryError::Contention`] when a lock wait
    /// times out or the transaction loses a serialization race.
    async fn admit(&self, request: AdmissionRequest) -> TaskRepositoryResult<AdmissionOutcome>;

    /// Finds a claim by identifier.
    async fn find_claim(&self, id: ClaimId) -> TaskRepositoryResult<Option<Claim>>;

    /// Writes a claim transition and the resulting task cascade in one
    /// transaction under the task lock.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskRepositoryError::StaleClaim`] when the stored
    /// claim no longer has the expected status, or
    /// [`super::TaskRepositoryError::Contention`] on lock timeout.
    async fn apply_transition(
        &self,
        transition: ClaimTransition,
    ) -> TaskRepositoryResult<TransitionOutcome>;

    /// Lists every claim on a task, oldest first.
    async fn claims_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Claim>>;

    /// Lists claims held by a user, newest first, optionally only those in
    /// `status`.
    async fn claims_for_user(
        &self,
        user_id: UserId,
        status: Option<ClaimStatus>,
    ) -> TaskRepositoryResult<Vec<Claim>>;
}
