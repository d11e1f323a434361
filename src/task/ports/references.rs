//! Port for records outside the task store that point at a task.

use super::TaskRepositoryResult;
use crate::task::domain::TaskId;
use async_trait::async_trait;

/// Answers whether other records still reference a task.
///
/// A referenced task cannot be deleted; referencing records are never
/// rewritten to drop the link.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskReferences: Send + Sync {
    /// Returns `true` when at least one record references the task.
    async fn is_task_referenced(&self, task_id: TaskId) -> TaskRepositoryResult<bool>;
}
