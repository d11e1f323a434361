//! In-memory claim ledger.

use async_trait::async_trait;
use std::cmp::Reverse;

use super::locks::LockError;
use super::task::InMemoryTaskRepository;
use crate::access::domain::UserId;
use crate::task::{
    domain::{AdmissionSnapshot, Claim, ClaimId, ClaimStatus, ConflictReport, TaskId},
    ports::{
        AdmissionOutcome, AdmissionRequest, ClaimLedger, ClaimTransition, TaskRepositoryError,
        TaskRepositoryResult, TransitionOutcome,
    },
};

fn lock_failure(err: LockError, task_id: TaskId) -> TaskRepositoryError {
    match err {
        LockError::TimedOut => TaskRepositoryError::Contention(task_id),
        LockError::Poisoned => {
            TaskRepositoryError::persistence(std::io::Error::other("lock table poisoned"))
        }
    }
}

#[async_trait]
impl ClaimLedger for InMemoryTaskRepository {
    async fn admission_snapshot(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskRepositoryResult<AdmissionSnapshot> {
        let state = self.read_state()?;
        Ok(state.snapshot(task_id, user_id))
    }

    async fn admit(&self, request: AdmissionRequest) -> TaskRepositoryResult<AdmissionOutcome> {
        let AdmissionRequest {
            candidate,
            rules,
            lock_timeout,
        } = request;
        let task_id = candidate.task_id();
        let user_id = candidate.user_id();

        let _task_guard = self
            .task_locks
            .acquire(task_id, lock_timeout)
            .await
            .map_err(|err| lock_failure(err, task_id))?;
        let _user_guard = self
            .user_locks
            .acquire(user_id, lock_timeout)
            .await
            .map_err(|err| lock_failure(err, task_id))?;

        let mut state = self.write_state()?;
        let report = ConflictReport::evaluate(&state.snapshot(task_id, user_id), rules);
        if report.has_conflicts() {
            return Ok(AdmissionOutcome::Rejected(report));
        }

        let active_after = state.tally(task_id).active + 1;
        let mut task = state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        task.record_admission(active_after, candidate.claimed_at());
        state.tasks.insert(task_id, task.clone());
        state.claims.insert(candidate.id(), candidate.clone());

        Ok(AdmissionOutcome::Admitted {
            claim: candidate,
            task,
        })
    }

    async fn find_claim(&self, id: ClaimId) -> TaskRepositoryResult<Option<Claim>> {
        let state = self.read_state()?;
        Ok(state.claims.get(&id).cloned())
    }

    async fn apply_transition(
        &self,
        transition: ClaimTransition,
    ) -> TaskRepositoryResult<TransitionOutcome> {
        let ClaimTransition {
            claim,
            expected,
            reopen_on_release,
            lock_timeout,
        } = transition;
        let task_id = claim.task_id();

        let _task_guard = self
            .task_locks
            .acquire(task_id, lock_timeout)
            .await
            .map_err(|err| lock_failure(err, task_id))?;

        let mut state = self.write_state()?;
        let stored_status = state
            .claims
            .get(&claim.id())
            .map(Claim::status)
            .ok_or(TaskRepositoryError::ClaimNotFound(claim.id()))?;
        if stored_status != expected {
            return Err(TaskRepositoryError::StaleClaim {
                claim_id: claim.id(),
                expected,
            });
        }
        let mut task = state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(TaskRepositoryError::NotFound(task_id))?;

        state.claims.insert(claim.id(), claim.clone());
        let tally = state.tally(task_id);
        let cascade =
            task.settle_claims(claim.status(), &tally, reopen_on_release, claim.updated_at());
        if cascade.is_some() {
            state.tasks.insert(task_id, task.clone());
        }

        Ok(TransitionOutcome {
            claim,
            task,
            cascade,
        })
    }

    async fn claims_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Claim>> {
        let state = self.read_state()?;
        let mut claims: Vec<Claim> = state.claims_on(task_id).cloned().collect();
        claims.sort_by_key(|claim| (claim.claimed_at(), claim.id()));
        Ok(claims)
    }

    async fn claims_for_user(
        &self,
        user_id: UserId,
        status: Option<ClaimStatus>,
    ) -> TaskRepositoryResult<Vec<Claim>> {
        let state = self.read_state()?;
        let mut claims: Vec<Claim> = state
            .claims
            .values()
            .filter(|claim| claim.user_id() == user_id)
            .filter(|claim| status.is_none_or(|wanted| claim.status() == wanted))
            .cloned()
            .collect();
        claims.sort_by_key(|claim| (Reverse(claim.claimed_at()), claim.id()));
        Ok(claims)
    }
}
