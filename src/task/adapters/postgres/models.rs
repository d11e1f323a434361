//! Diesel row models for task and claim persistence.

use super::schema::{task_claims, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Creating user.
    pub creator_id: uuid::Uuid,
    /// Short title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Work category.
    pub task_type: String,
    /// Street address.
    pub address: String,
    /// Free-form directions.
    pub location_details: Option<String>,
    /// Capacity.
    pub required_volunteers: i32,
    /// Skill list.
    pub required_skills: Value,
    /// Optional deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Listing priority.
    pub priority_level: i16,
    /// Lifecycle status.
    pub status: String,
    /// Review state.
    pub approval_status: String,
    /// Reviewer.
    pub approved_by: Option<uuid::Uuid>,
    /// Review time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Reviewer's remarks.
    pub approval_notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and full-replacement model for task records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskRecord {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Creating user.
    pub creator_id: uuid::Uuid,
    /// Short title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Work category.
    pub task_type: String,
    /// Street address.
    pub address: String,
    /// Free-form directions.
    pub location_details: Option<String>,
    /// Capacity.
    pub required_volunteers: i32,
    /// Skill list.
    pub required_skills: Value,
    /// Optional deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Listing priority.
    pub priority_level: i16,
    /// Lifecycle status.
    pub status: String,
    /// Review state.
    pub approval_status: String,
    /// Reviewer.
    pub approved_by: Option<uuid::Uuid>,
    /// Review time.
    pub approved_at: Option<DateTime<Utc>>,
    /// Reviewer's remarks.
    pub approval_notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query result row for claim records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_claims)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClaimRow {
    /// Claim identifier.
    pub id: uuid::Uuid,
    /// Parent task.
    pub task_id: uuid::Uuid,
    /// Claiming user.
    pub user_id: uuid::Uuid,
    /// Claim status.
    pub status: String,
    /// Volunteer notes.
    pub notes: Option<String>,
    /// Reservation time.
    pub claimed_at: DateTime<Utc>,
    /// Start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Release time.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and full-replacement model for claim records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = task_claims)]
#[diesel(treat_none_as_null = true)]
pub struct ClaimRecord {
    /// Claim identifier.
    pub id: uuid::Uuid,
    /// Parent task.
    pub task_id: uuid::Uuid,
    /// Claiming user.
    pub user_id: uuid::Uuid,
    /// Claim status.
    pub status: String,
    /// Volunteer notes.
    pub notes: Option<String>,
    /// Reservation time.
    pub claimed_at: DateTime<Utc>,
    /// Start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
    /// Release time.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
