//! Repository port for needs and their assignment trail.

use crate::access::domain::UserId;
use crate::error::FailureKind;
use crate::need::domain::{Assignment, Need, NeedId, NeedRevision, NeedStatus, NeedType};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::TimeDelta;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for need repository operations.
pub type NeedRepositoryResult<T> = Result<T, NeedRepositoryError>;

/// Which needs a listing may reveal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NeedVisibility {
    /// Every need.
    #[default]
    Everything,
    /// Needs reported by the user.
    ReportedBy(UserId),
    /// Open needs plus needs assigned to the user.
    OpenOrAssignedTo(UserId),
}

/// Filters for need listings.
///
/// Results are ordered by urgency (most urgent first), then newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedQuery {
    /// Visibility restriction.
    pub visibility: NeedVisibility,
    /// Only needs in this status.
    pub status: Option<NeedStatus>,
    /// Only needs of this type.
    pub need_type: Option<NeedType>,
    /// Only needs at or above this urgency.
    pub min_urgency: Option<u8>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl NeedQuery {
    /// Returns `true` when the need passes every filter except `limit`.
    #[must_use]
    pub fn matches(&self, need: &Need) -> bool {
        let visible = match self.visibility {
            NeedVisibility::Everything => true,
            NeedVisibility::ReportedBy(user_id) => need.reporter_id() == user_id,
            NeedVisibility::OpenOrAssignedTo(user_id) => {
                need.status() == NeedStatus::Open || need.is_assignee(user_id)
            }
        };
        visible
            && self.status.is_none_or(|status| need.status() == status)
            && self
                .need_type
                .is_none_or(|need_type| need.content().need_type() == need_type)
            && self
                .min_urgency
                .is_none_or(|floor| need.content().urgency().value() >= floor)
    }
}

/// Aggregate counts over all needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedStatistics {
    /// Number of needs.
    pub total: u64,
    /// Needs per status.
    pub by_status: BTreeMap<&'static str, u64>,
    /// Needs per type.
    pub by_type: BTreeMap<&'static str, u64>,
    /// Needs per urgency level.
    pub by_urgency: BTreeMap<u8, u64>,
    /// Mean time from report to resolution over needs that were resolved.
    pub average_resolution: Option<TimeDelta>,
}

impl NeedStatistics {
    /// Returns the number of needs in `status`.
    #[must_use]
    pub fn count_with_status(&self, status: NeedStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Averages resolution times, or `None` when there are none.
    #[must_use]
    pub fn mean_duration(durations: impl IntoIterator<Item = TimeDelta>) -> Option<TimeDelta> {
        let (sum, count) = durations
            .into_iter()
            .fold((TimeDelta::zero(), 0_i32), |(sum, count), duration| {
                (sum + duration, count.saturating_add(1))
            });
        (count > 0).then(|| sum / count)
    }
}

/// Need persistence contract.
///
/// Assignment records are append-only: implementations insert them and
/// never update or delete them.
#[async_trait]
pub trait NeedRepository: Send + Sync {
    /// Stores a new need.
    ///
    /// # Errors
    ///
    /// Returns [`NeedRepositoryError::DuplicateNeed`] when the ID exists.
    async fn store(&self, need: &Need) -> NeedRepositoryResult<()>;

    /// Finds a need by identifier.
    async fn find_by_id(&self, id: NeedId) -> NeedRepositoryResult<Option<Need>>;

    /// Lists needs matching the query.
    async fn list(&self, query: &NeedQuery) -> NeedRepositoryResult<Vec<Need>>;

    /// Replaces a need that still matches `expected` and appends
    /// `assignment`, both in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`NeedRepositoryError::NotFound`] or
    /// [`NeedRepositoryError::StaleState`] when the stored need changed since
    /// it was read.
    async fn update(
        &self,
        need: &Need,
        expected: NeedRevision,
        assignment: Option<&Assignment>,
    ) -> NeedRepositoryResult<()>;

    /// Deletes a need that has no assignment records.
    ///
    /// # Errors
    ///
    /// Returns [`NeedRepositoryError::NotFound`] or
    /// [`NeedRepositoryError::HasAssignments`].
    async fn delete_unassigned(&self, id: NeedId) -> NeedRepositoryResult<()>;

    /// Lists a need's assignment records, oldest first.
    async fn assignments(&self, need_id: NeedId) -> NeedRepositoryResult<Vec<Assignment>>;

    /// Lists assignment records naming `user_id` as assignee, newest first.
    async fn assignments_for_user(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> NeedRepositoryResult<Vec<Assignment>>;

    /// Computes aggregate counts from a non-locking snapshot.
    async fn statistics(&self) -> NeedRepositoryResult<NeedStatistics>;
}

/// Errors returned by need repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NeedRepositoryError {
    /// A need with the same identifier already exists.
    #[error("duplicate need identifier: {0}")]
    DuplicateNeed(NeedId),

    /// The need does not exist.
    #[error("need not found: {0}")]
    NotFound(NeedId),

    /// The need changed after it was read.
    #[error("need {need_id} changed concurrently (expected status {expected})")]
    StaleState {
        /// Need identifier.
        need_id: NeedId,
        /// Status the caller observed.
        expected: NeedStatus,
    },

    /// An assignment record names a task that does not exist.
    #[error("task not found: {0}")]
    UnknownTask(TaskId),

    /// The need has an assignment trail and cannot be deleted.
    #[error("need {0} has assignment records")]
    HasAssignments(NeedId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NeedRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns the failure category callers observe.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) | Self::UnknownTask(_) => FailureKind::NotFound,
            Self::StaleState { .. } | Self::HasAssignments(_) => FailureKind::InvalidState,
            Self::DuplicateNeed(_) | Self::Persistence(_) => FailureKind::Infrastructure,
        }
    }
}
