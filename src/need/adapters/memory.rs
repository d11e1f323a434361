//! In-memory need repository for tests and embedded use.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::access::domain::UserId;
use crate::need::{
    domain::{Assignment, Need, NeedId, NeedRevision},
    ports::{
        NeedQuery, NeedRepository, NeedRepositoryError, NeedRepositoryResult, NeedStatistics,
    },
};
use crate::task::{
    domain::TaskId,
    ports::{TaskReferences, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory need store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNeedRepository {
    state: Arc<RwLock<InMemoryNeedState>>,
}

#[derive(Debug, Default)]
struct InMemoryNeedState {
    needs: HashMap<NeedId, Need>,
    assignments: Vec<Assignment>,
}

impl InMemoryNeedRepository {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> NeedRepositoryResult<RwLockReadGuard<'_, InMemoryNeedState>> {
        self.state.read().map_err(|err| {
            NeedRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_state(&self) -> NeedRepositoryResult<RwLockWriteGuard<'_, InMemoryNeedState>> {
        self.state.write().map_err(|err| {
            NeedRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl NeedRepository for InMemoryNeedRepository {
    async fn store(&self, need: &Need) -> NeedRepositoryResult<()> {
        let mut state = self.write_state()?;
        if state.needs.contains_key(&need.id()) {
            return Err(NeedRepositoryError::DuplicateNeed(need.id()));
        }
        state.needs.insert(need.id(), need.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: NeedId) -> NeedRepositoryResult<Option<Need>> {
        let state = self.read_state()?;
        Ok(state.needs.get(&id).cloned())
    }

    async fn list(&self, query: &NeedQuery) -> NeedRepositoryResult<Vec<Need>> {
        let state = self.read_state()?;
        let mut needs: Vec<Need> = state
            .needs
            .values()
            .filter(|need| query.matches(need))
            .cloned()
            .collect();
        needs.sort_by_key(|need| {
            (
                Reverse(need.content().urgency()),
                Reverse(need.created_at()),
                need.id(),
            )
        });
        if let Some(limit) = query.limit {
            needs.truncate(limit);
        }
        Ok(needs)
    }

    async fn update(
        &self,
        need: &Need,
        expected: NeedRevision,
        assignment: Option<&Assignment>,
    ) -> NeedRepositoryResult<()> {
        let mut state = self.write_state()?;
        let stored = state
            .needs
            .get(&need.id())
            .ok_or(NeedRepositoryError::NotFound(need.id()))?;
        if stored.revision() != expected {
            return Err(NeedRepositoryError::StaleState {
                need_id: need.id(),
                expected: expected.status,
            });
        }
        state.needs.insert(need.id(), need.clone());
        if let Some(record) = assignment {
            state.assignments.push(record.clone());
        }
        Ok(())
    }

    async fn delete_unassigned(&self, id: NeedId) -> NeedRepositoryResult<()> {
        let mut state = self.write_state()?;
        if !state.needs.contains_key(&id) {
            return Err(NeedRepositoryError::NotFound(id));
        }
        if state.assignments.iter().any(|record| record.need_id() == id) {
            return Err(NeedRepositoryError::HasAssignments(id));
        }
        state.needs.remove(&id);
        Ok(())
    }

    async fn assignments(&self, need_id: NeedId) -> NeedRepositoryResult<Vec<Assignment>> {
        let state = self.read_state()?;
        Ok(state
            .assignments
            .iter()
            .filter(|record| record.need_id() == need_id)
            .cloned()
            .collect())
    }

    async fn assignments_for_user(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> NeedRepositoryResult<Vec<Assignment>> {
        let state = self.read_state()?;
        Ok(state
            .assignments
            .iter()
            .rev()
            .filter(|record| record.assignee_id() == user_id)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn statistics(&self) -> NeedRepositoryResult<NeedStatistics> {
        let state = self.read_state()?;
        let mut statistics = NeedStatistics::default();
        for need in state.needs.values() {
            statistics.total += 1;
            *statistics
                .by_status
                .entry(need.status().as_str())
                .or_default() += 1;
            *statistics
                .by_type
                .entry(need.content().need_type().as_str())
                .or_default() += 1;
            *statistics
                .by_urgency
                .entry(need.content().urgency().value())
                .or_default() += 1;
        }
        statistics.average_resolution = NeedStatistics::mean_duration(
            state.needs.values().filter_map(|need| {
                need.resolved_at()
                    .map(|resolved_at| resolved_at - need.created_at())
            }),
        );
        Ok(statistics)
    }
}

#[async_trait]
impl TaskReferences for InMemoryNeedRepository {
    async fn is_task_referenced(&self, task_id: TaskId) -> TaskRepositoryResult<bool> {
        let state = self.read_state().map_err(TaskRepositoryError::persistence)?;
        Ok(state
            .assignments
            .iter()
            .any(|record| record.task_id() == Some(task_id)))
    }
}
