//! `PostgreSQL` implementation of [`NeedRepository`].

use super::{
    models::{AssignmentRow, NeedRecord, NeedRow},
    schema::{need_assignments, needs},
};
use crate::access::domain::UserId;
use crate::need::{
    domain::{
        Assignment, AssignmentId, AssignmentStatus, Need, NeedContent, NeedId, NeedRevision,
        NeedStatus, NeedType, PersistedAssignmentData, PersistedNeedData, UrgencyLevel,
    },
    ports::{
        NeedQuery, NeedRepository, NeedRepositoryError, NeedRepositoryResult, NeedStatistics,
        NeedVisibility,
    },
};
use crate::pg::{PgPool, get_conn, run_blocking};
use crate::task::{
    domain::TaskId,
    ports::{TaskReferences, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, exists};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed need store.
#[derive(Debug, Clone)]
pub struct PostgresNeedRepository {
    pool: PgPool,
}

impl PostgresNeedRepository {
    /// Creates a repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run<F, T>(&self, f: F) -> NeedRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> NeedRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(
            move || {
                let mut connection = get_conn(&pool, NeedRepositoryError::persistence)?;
                f(&mut connection)
            },
            NeedRepositoryError::persistence,
        )
        .await
    }
}

/// Foreign key from an assignment record to its optional task.
const ASSIGNMENT_TASK_FK: &str = "fk_need_assignments_task";

impl From<DieselError> for NeedRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

fn to_need_record(need: &Need) -> NeedRecord {
    let content = need.content();
    NeedRecord {
        id: need.id().into_inner(),
        reporter_id: need.reporter_id().into_inner(),
        title: content.title().to_owned(),
        description: content.description().to_owned(),
        need_type: content.need_type().as_str().to_owned(),
        address: content.address().to_owned(),
        urgency_level: i16::from(content.urgency().value()),
        status: need.status().as_str().to_owned(),
        assigned_to: need.assigned_to().map(UserId::into_inner),
        assigned_at: need.assigned_at(),
        resolved_at: need.resolved_at(),
        created_at: need.created_at(),
        updated_at: need.updated_at(),
    }
}

fn row_to_need(row: NeedRow) -> NeedRepositoryResult<Need> {
    let urgency = u8::try_from(row.urgency_level).map_err(NeedRepositoryError::persistence)?;
    let content = NeedContent::new(
        row.title,
        row.description,
        NeedType::try_from(row.need_type.as_str()).map_err(NeedRepositoryError::persistence)?,
        row.address,
        UrgencyLevel::new(urgency).map_err(NeedRepositoryError::persistence)?,
    )
    .map_err(NeedRepositoryError::persistence)?;

    Ok(Need::from_persisted(PersistedNeedData {
        id: NeedId::from_uuid(row.id),
        reporter_id: UserId::from_uuid(row.reporter_id),
        content,
        status: NeedStatus::try_from(row.status.as_str())
            .map_err(NeedRepositoryError::persistence)?,
        assigned_to: row.assigned_to.map(UserId::from_uuid),
        assigned_at: row.assigned_at,
        resolved_at: row.resolved_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn to_assignment_row(record: &Assignment) -> AssignmentRow {
    AssignmentRow {
        id: record.id().into_inner(),
        need_id: record.need_id().into_inner(),
        task_id: record.task_id().map(TaskId::into_inner),
        user_id: record.assignee_id().into_inner(),
        recorded_by: record.recorded_by().into_inner(),
        status: record.status().as_str().to_owned(),
        notes: record.notes().map(str::to_owned),
        recorded_at: record.recorded_at(),
    }
}

fn row_to_assignment(row: AssignmentRow) -> NeedRepositoryResult<Assignment> {
    Ok(Assignment::from_persisted(PersistedAssignmentData {
        id: AssignmentId::from_uuid(row.id),
        need_id: NeedId::from_uuid(row.need_id),
        task_id: row.task_id.map(TaskId::from_uuid),
        assignee_id: UserId::from_uuid(row.user_id),
        recorded_by: UserId::from_uuid(row.recorded_by),
        status: AssignmentStatus::try_from(row.status.as_str())
            .map_err(NeedRepositoryError::persistence)?,
        notes: row.notes,
        recorded_at: row.recorded_at,
    }))
}

#[async_trait]
impl NeedRepository for PostgresNeedRepository {
    async fn store(&self, need: &Need) -> NeedRepositoryResult<()> {
        let need_id = need.id();
        let record = to_need_record(need);
        self.run(move |connection| {
            diesel::insert_into(needs::table)
                .values(&record)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        NeedRepositoryError::DuplicateNeed(need_id)
                    }
                    _ => NeedRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: NeedId) -> NeedRepositoryResult<Option<Need>> {
        self.run(move |connection| {
            let row = needs::table
                .find(id.into_inner())
                .select(NeedRow::as_select())
                .first::<NeedRow>(connection)
                .optional()?;
            row.map(row_to_need).transpose()
        })
        .await
    }

    async fn list(&self, query: &NeedQuery) -> NeedRepositoryResult<Vec<Need>> {
        let filters = query.clone();
        let limit = filters
            .limit
            .map(i64::try_from)
            .transpose()
            .map_err(NeedRepositoryError::persistence)?;
        self.run(move |connection| {
            let mut statement = needs::table.select(NeedRow::as_select()).into_boxed();
            statement = match filters.visibility {
                NeedVisibility::Everything => statement,
                NeedVisibility::ReportedBy(user_id) => {
                    statement.filter(needs::reporter_id.eq(user_id.into_inner()))
                }
                NeedVisibility::OpenOrAssignedTo(user_id) => statement.filter(
                    needs::status
                        .eq(NeedStatus::Open.as_str())
                        .or(needs::assigned_to.eq(user_id.into_inner())),
                ),
            };
            if let Some(status) = filters.status {
                statement = statement.filter(needs::status.eq(status.as_str()));
            }
            if let Some(need_type) = filters.need_type {
                statement = statement.filter(needs::need_type.eq(need_type.as_str()));
            }
            if let Some(floor) = filters.min_urgency {
                statement = statement.filter(needs::urgency_level.ge(i16::from(floor)));
            }
            if let Some(max_rows) = limit {
                statement = statement.limit(max_rows);
            }
            statement
                .order((
                    needs::urgency_level.desc(),
                    needs::created_at.desc(),
                    needs::id.asc(),
                ))
                .load::<NeedRow>(connection)?
                .into_iter()
                .map(row_to_need)
                .collect()
        })
        .await
    }

    async fn update(
        &self,
        need: &Need,
        expected: NeedRevision,
        assignment: Option<&Assignment>,
    ) -> NeedRepositoryResult<()> {
        let need_id = need.id();
        let record = to_need_record(need);
        let appended = assignment.map(to_assignment_row);
        self.run(move |connection| {
            connection.transaction::<_, NeedRepositoryError, _>(|tx| {
                let updated = diesel::update(
                    needs::table
                        .filter(needs::id.eq(need_id.into_inner()))
                        .filter(needs::status.eq(expected.status.as_str()))
                        .filter(needs::updated_at.eq(expected.updated_at)),
                )
                .set(&record)
                .execute(tx)?;
                if updated == 0 {
                    let found = diesel::select(exists(needs::table.find(need_id.into_inner())))
                        .get_result::<bool>(tx)?;
                    return Err(if found {
                        NeedRepositoryError::StaleState {
                            need_id,
                            expected: expected.status,
                        }
                    } else {
                        NeedRepositoryError::NotFound(need_id)
                    });
                }
                if let Some(row) = appended {
                    let task_id = row.task_id;
                    diesel::insert_into(need_assignments::table)
                        .values(&row)
                        .execute(tx)
                        .map_err(|err| {
                            let missing_task = match &err {
                                DieselError::DatabaseError(
                                    DatabaseErrorKind::ForeignKeyViolation,
                                    info,
                                ) => info.constraint_name() == Some(ASSIGNMENT_TASK_FK),
                                _ => false,
                            };
                            match task_id {
                                Some(missing) if missing_task => {
                                    NeedRepositoryError::UnknownTask(TaskId::from_uuid(missing))
                                }
                                _ => NeedRepositoryError::persistence(err),
                            }
                        })?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn delete_unassigned(&self, id: NeedId) -> NeedRepositoryResult<()> {
        self.run(move |connection| {
            connection.transaction::<_, NeedRepositoryError, _>(|tx| {
                needs::table
                    .find(id.into_inner())
                    .select(needs::id)
                    .for_update()
                    .first::<uuid::Uuid>(tx)
                    .optional()?
                    .ok_or(NeedRepositoryError::NotFound(id))?;
                let has_trail = diesel::select(exists(
                    need_assignments::table.filter(need_assignments::need_id.eq(id.into_inner())),
                ))
                .get_result::<bool>(tx)?;
                if has_trail {
                    return Err(NeedRepositoryError::HasAssignments(id));
                }
                diesel::delete(needs::table.find(id.into_inner())).execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn assignments(&self, need_id: NeedId) -> NeedRepositoryResult<Vec<Assignment>> {
        self.run(move |connection| {
            need_assignments::table
                .filter(need_assignments::need_id.eq(need_id.into_inner()))
                .order((need_assignments::recorded_at.asc(), need_assignments::id.asc()))
                .select(AssignmentRow::as_select())
                .load::<AssignmentRow>(connection)?
                .into_iter()
                .map(row_to_assignment)
                .collect()
        })
        .await
    }

    async fn assignments_for_user(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> NeedRepositoryResult<Vec<Assignment>> {
        let max_rows = limit
            .map(i64::try_from)
            .transpose()
            .map_err(NeedRepositoryError::persistence)?;
        self.run(move |connection| {
            let mut statement = need_assignments::table
                .select(AssignmentRow::as_select())
                .filter(need_assignments::user_id.eq(user_id.into_inner()))
                .order((need_assignments::recorded_at.desc(), need_assignments::id.asc()))
                .into_boxed();
            if let Some(rows) = max_rows {
                statement = statement.limit(rows);
            }
            statement
                .load::<AssignmentRow>(connection)?
                .into_iter()
                .map(row_to_assignment)
                .collect()
        })
        .await
    }

    async fn statistics(&self) -> NeedRepositoryResult<NeedStatistics> {
        self.run(|connection| {
            let status_rows = needs::table
                .group_by(needs::status)
                .select((needs::status, count_star()))
                .load::<(String, i64)>(connection)?;
            let type_rows = needs::table
                .group_by(needs::need_type)
                .select((needs::need_type, count_star()))
                .load::<(String, i64)>(connection)?;
            let urgency_rows = needs::table
                .group_by(needs::urgency_level)
                .select((needs::urgency_level, count_star()))
                .load::<(i16, i64)>(connection)?;
            let resolved = needs::table
                .filter(needs::resolved_at.is_not_null())
                .select((needs::created_at, needs::resolved_at))
                .load::<(DateTime<Utc>, Option<DateTime<Utc>>)>(connection)?;

            let mut statistics = NeedStatistics::default();
            for (status, count) in status_rows {
                let canonical = NeedStatus::try_from(status.as_str())
                    .map_err(NeedRepositoryError::persistence)?;
                let total = to_count(count)?;
                statistics.total = statistics.total.saturating_add(total);
                statistics.by_status.insert(canonical.as_str(), total);
            }
            for (need_type, count) in type_rows {
                let canonical = NeedType::try_from(need_type.as_str())
                    .map_err(NeedRepositoryError::persistence)?;
                statistics.by_type.insert(canonical.as_str(), to_count(count)?);
            }
            for (level, count) in urgency_rows {
                let urgency = u8::try_from(level).map_err(NeedRepositoryError::persistence)?;
                statistics.by_urgency.insert(urgency, to_count(count)?);
            }
            statistics.average_resolution =
                NeedStatistics::mean_duration(resolved.into_iter().filter_map(
                    |(created_at, resolved_at)| {
                        resolved_at.map(|resolved_at| resolved_at - created_at)
                    },
                ));
            Ok(statistics)
        })
        .await
    }
}

#[async_trait]
impl TaskReferences for PostgresNeedRepository {
    async fn is_task_referenced(&self, task_id: TaskId) -> TaskRepositoryResult<bool> {
        self.run(move |connection| {
            Ok(diesel::select(exists(
                need_assignments::table
                    .filter(need_assignments::task_id.eq(task_id.into_inner())),
            ))
            .get_result::<bool>(connection)?)
        })
        .await
        .map_err(TaskRepositoryError::persistence)
    }
}

fn to_count(count: i64) -> NeedRepositoryResult<u64> {
    u64::try_from(count).map_err(NeedRepositoryError::persistence)
}
