//! Conversions between domain aggregates and diesel rows, and diesel error
//! classification.

use super::models::{ClaimRecord, ClaimRow, TaskRecord, TaskRow};
use crate::access::domain::UserId;
use crate::task::{
    domain::{
        ApprovalStatus, Claim, ClaimId, ClaimStatus, PersistedClaimData, PersistedTaskData,
        PriorityLevel, RequiredVolunteers, Task, TaskDetails, TaskId, TaskLocation, TaskReview,
        TaskStatus, TaskTitle, TaskType,
    },
    ports::{TaskRepositoryError, TaskRepositoryResult},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Partial unique index enforcing one active claim per user and task.
pub(super) const ACTIVE_CLAIM_INDEX: &str = "idx_task_claims_active_user_task";

/// Claim statuses that occupy a slot, in storage form.
pub(super) const ACTIVE_CLAIM_STATUSES: [&str; 2] = [
    ClaimStatus::Claimed.as_str(),
    ClaimStatus::Started.as_str(),
];

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// Maps lock timeouts and serialization failures to
/// [`TaskRepositoryError::Contention`].
pub(super) fn classify(err: DieselError, task_id: TaskId) -> TaskRepositoryError {
    let contended = match &err {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => true,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            info.constraint_name() == Some(ACTIVE_CLAIM_INDEX)
        }
        DieselError::DatabaseError(_, info) => info.message().contains("lock timeout"),
        _ => false,
    };
    if contended {
        TaskRepositoryError::Contention(task_id)
    } else {
        TaskRepositoryError::persistence(err)
    }
}

pub(super) fn to_task_record(task: &Task) -> TaskRepositoryResult<TaskRecord> {
    let details = task.details();
    let required_volunteers = i32::try_from(details.required_volunteers.value())
        .map_err(TaskRepositoryError::persistence)?;
    let required_skills =
        serde_json::to_value(&details.required_skills).map_err(TaskRepositoryError::persistence)?;

    Ok(TaskRecord {
        id: task.id().into_inner(),
        creator_id: task.creator_id().into_inner(),
        title: details.title.as_str().to_owned(),
        description: details.description.clone(),
        task_type: details.task_type.as_str().to_owned(),
        address: details.location.address().to_owned(),
        location_details: details.location.details().map(str::to_owned),
        required_volunteers,
        required_skills,
        deadline: details.deadline,
        priority_level: i16::from(details.priority.value()),
        status: task.status().as_str().to_owned(),
        approval_status: task.approval_status().as_str().to_owned(),
        approved_by: task.review().map(|review| review.reviewer_id.into_inner()),
        approved_at: task.review().map(|review| review.reviewed_at),
        approval_notes: task.review().and_then(|review| review.notes.clone()),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

pub(super) fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let capacity =
        u32::try_from(row.required_volunteers).map_err(TaskRepositoryError::persistence)?;
    let priority = u8::try_from(row.priority_level).map_err(TaskRepositoryError::persistence)?;
    let mut location = TaskLocation::new(row.address).map_err(TaskRepositoryError::persistence)?;
    if let Some(directions) = row.location_details {
        location = location.with_details(directions);
    }

    let details = TaskDetails {
        title: TaskTitle::new(row.title).map_err(TaskRepositoryError::persistence)?,
        description: row.description,
        task_type: TaskType::try_from(row.task_type.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        location,
        required_volunteers: RequiredVolunteers::new(capacity)
            .map_err(TaskRepositoryError::persistence)?,
        required_skills: serde_json::from_value(row.required_skills)
            .map_err(TaskRepositoryError::persistence)?,
        deadline: row.deadline,
        priority: PriorityLevel::new(priority).map_err(TaskRepositoryError::persistence)?,
    };
    let review = match (row.approved_by, row.approved_at) {
        (Some(reviewer), Some(reviewed_at)) => Some(TaskReview {
            reviewer_id: UserId::from_uuid(reviewer),
            reviewed_at,
            notes: row.approval_notes,
        }),
        _ => None,
    };

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        creator_id: UserId::from_uuid(row.creator_id),
        details,
        status: TaskStatus::try_from(row.status.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        approval_status: ApprovalStatus::try_from(row.approval_status.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        review,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

pub(super) fn to_claim_record(claim: &Claim) -> ClaimRecord {
    ClaimRecord {
        id: claim.id().into_inner(),
        task_id: claim.task_id().into_inner(),
        user_id: claim.user_id().into_inner(),
        status: claim.status().as_str().to_owned(),
        notes: claim.notes().map(str::to_owned),
        claimed_at: claim.claimed_at(),
        started_at: claim.started_at(),
        completed_at: claim.completed_at(),
        cancelled_at: claim.cancelled_at(),
        updated_at: claim.updated_at(),
    }
}

pub(super) fn row_to_claim(row: ClaimRow) -> TaskRepositoryResult<Claim> {
    Ok(Claim::from_persisted(PersistedClaimData {
        id: ClaimId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        user_id: UserId::from_uuid(row.user_id),
        status: ClaimStatus::try_from(row.status.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        notes: row.notes,
        claimed_at: row.claimed_at,
        started_at: row.started_at,
        completed_at: row.completed_at,
        cancelled_at: row.cancelled_at,
        updated_at: row.updated_at,
    }))
}

pub(super) fn count_to_u32(count: i64) -> TaskRepositoryResult<u32> {
    u32::try_from(count).map_err(TaskRepositoryError::persistence)
}
