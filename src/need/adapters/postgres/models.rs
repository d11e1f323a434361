//! Diesel row models for need persistence.

use super::schema::{need_assignments, needs};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for needs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = needs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NeedRow {
    /// Need identifier.
    pub id: uuid::Uuid,
    /// Reporting user.
    pub reporter_id: uuid::Uuid,
    /// Short title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Need category.
    pub need_type: String,
    /// Street address.
    pub address: String,
    /// Urgency.
    pub urgency_level: i16,
    /// Lifecycle status.
    pub status: String,
    /// Current assignee.
    pub assigned_to: Option<uuid::Uuid>,
    /// Assignment time.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and full-replacement model for needs.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = needs)]
#[diesel(treat_none_as_null = true)]
pub struct NeedRecord {
    /// Need identifier.
    pub id: uuid::Uuid,
    /// Reporting user.
    pub reporter_id: uuid::Uuid,
    /// Short title.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Need category.
    pub need_type: String,
    /// Street address.
    pub address: String,
    /// Urgency.
    pub urgency_level: i16,
    /// Lifecycle status.
    pub status: String,
    /// Current assignee.
    pub assigned_to: Option<uuid::Uuid>,
    /// Assignment time.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for assignment records; inserted, never updated.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = need_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    /// Record identifier.
    pub id: uuid::Uuid,
    /// Need the record belongs to.
    pub need_id: uuid::Uuid,
    /// Linked task.
    pub task_id: Option<uuid::Uuid>,
    /// Responsible user.
    pub user_id: uuid::Uuid,
    /// User whose action produced the record.
    pub recorded_by: uuid::Uuid,
    /// Captured status.
    pub status: String,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Append time.
    pub recorded_at: DateTime<Utc>,
}
