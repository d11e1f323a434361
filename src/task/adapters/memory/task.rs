//! In-memory task repository for tests and embedded use.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::locks::LockTable;
use crate::access::domain::UserId;
use crate::task::{
    domain::{
        AdmissionSnapshot, AdmissionTaskState, ApprovalStatus, Claim, ClaimId, ClaimTally, Task,
        TaskId, TaskStatus,
    },
    ports::{
        TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskStatistics,
    },
};

/// Thread-safe in-memory task store.
///
/// Implements both [`TaskRepository`] and
/// [`ClaimLedger`](crate::task::ports::ClaimLedger) over shared state, with
/// per-task and per-user async locks standing in for row locks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
    pub(super) task_locks: Arc<LockTable<TaskId>>,
    pub(super) user_locks: Arc<LockTable<UserId>>,
}

#[derive(Debug, Default)]
pub(super) struct InMemoryTaskState {
    pub(super) tasks: HashMap<TaskId, Task>,
    pub(super) claims: HashMap<ClaimId, Claim>,
}

impl InMemoryTaskState {
    pub(super) fn claims_on(&self, task_id: TaskId) -> impl Iterator<Item = &Claim> {
        self.claims
            .values()
            .filter(move |claim| claim.task_id() == task_id)
    }

    pub(super) fn tally(&self, task_id: TaskId) -> ClaimTally {
        ClaimTally::from_statuses(self.claims_on(task_id).map(Claim::status))
    }

    pub(super) fn snapshot(&self, task_id: TaskId, user_id: UserId) -> AdmissionSnapshot {
        let task = self.tasks.get(&task_id).map(|task| AdmissionTaskState {
            status: task.status(),
            capacity: task.capacity(),
        });
        let active_on_task = self
            .claims_on(task_id)
            .filter(|claim| claim.is_active())
            .count();
        let user_holds_claim = self
            .claims_on(task_id)
            .any(|claim| claim.is_active() && claim.user_id() == user_id);
        let active_for_user = self
            .claims
            .values()
            .filter(|claim| claim.is_active() && claim.user_id() == user_id)
            .count();

        AdmissionSnapshot {
            task_id,
            user_id,
            task,
            active_on_task: saturating_u32(active_on_task),
            user_holds_claim,
            active_for_user: saturating_u32(active_for_user),
        }
    }

    fn guard_unclaimed(&self, task_id: TaskId, expected: TaskStatus) -> TaskRepositoryResult<()> {
        let stored = self
            .tasks
            .get(&task_id)
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        if stored.status() != expected {
            return Err(TaskRepositoryError::StaleState { task_id, expected });
        }
        if self.claims_on(task_id).next().is_some() {
            return Err(TaskRepositoryError::HasClaims(task_id));
        }
        Ok(())
    }
}

fn saturating_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn read_state(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    pub(super) fn write_state(
        &self,
    ) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write_state()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read_state()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| query.matches(task))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| {
            (
                Reverse(task.details().priority),
                Reverse(task.created_at()),
                task.id(),
            )
        });
        if let Some(limit) = query.limit {
            tasks.truncate(limit);
        }
        Ok(tasks)
    }

    async fn update_unclaimed(
        &self,
        task: &Task,
        expected: TaskStatus,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write_state()?;
        state.guard_unclaimed(task.id(), expected)?;
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn delete_unclaimed(&self, id: TaskId, expected: TaskStatus) -> TaskRepositoryResult<()> {
        let mut state = self.write_state()?;
        state.guard_unclaimed(id, expected)?;
        state.tasks.remove(&id);
        Ok(())
    }

    async fn statistics(&self) -> TaskRepositoryResult<TaskStatistics> {
        let state = self.read_state()?;
        let mut stats = TaskStatistics::default();
        for task in state.tasks.values() {
            stats.total += 1;
            *stats.by_status.entry(task.status().as_str()).or_default() += 1;
            *stats
                .by_type
                .entry(task.details().task_type.as_str())
                .or_default() += 1;
            if task.approval_status() == ApprovalStatus::Pending {
                stats.pending_approval += 1;
            }
        }
        let volunteers: HashSet<UserId> = state
            .claims
            .values()
            .filter(|claim| claim.is_active())
            .map(Claim::user_id)
            .collect();
        stats.active_volunteers = u64::try_from(volunteers.len()).unwrap_or(u64::MAX);
        Ok(stats)
    }
}
