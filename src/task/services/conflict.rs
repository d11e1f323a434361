//! Read-only claim conflict checks.

use crate::access::domain::UserId;
use crate::task::{
    domain::{AdmissionRules, ConflictReport, TaskId},
    ports::{ClaimLedger, TaskRepositoryResult},
};
use std::sync::Arc;

/// Stateless validator answering "could this user claim this task now?".
///
/// The answer is advisory: it reads without locks, so it can be stale by the
/// time a claim commits. [`super::ClaimAdmissionService`] repeats the same
/// evaluation under the task lock.
pub struct ConflictChecker<L>
where
    L: ClaimLedger,
{
    ledger: Arc<L>,
    rules: AdmissionRules,
}

impl<L> Clone for ConflictChecker<L>
where
    L: ClaimLedger,
{
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            rules: self.rules,
        }
    }
}

impl<L> ConflictChecker<L>
where
    L: ClaimLedger,
{
    /// Creates a checker over the given ledger.
    #[must_use]
    pub const fn new(ledger: Arc<L>, rules: AdmissionRules) -> Self {
        Self { ledger, rules }
    }

    /// Returns the rules the checker applies.
    #[must_use]
    pub const fn rules(&self) -> AdmissionRules {
        self.rules
    }

    /// Evaluates every admission rule against a fresh non-locking read.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the snapshot cannot be read.
    pub async fn check(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskRepositoryResult<ConflictReport> {
        let snapshot = self.ledger.admission_snapshot(task_id, user_id).await?;
        Ok(ConflictReport::evaluate(&snapshot, self.rules))
    }
}
