//! `PostgreSQL` implementation of [`TaskRepository`].

use super::{
    mapping::{ACTIVE_CLAIM_STATUSES, count_to_u32, row_to_task, to_task_record},
    models::TaskRow,
    schema::{task_claims, tasks},
};
use crate::pg::{PgPool, get_conn, run_blocking};
use crate::task::{
    domain::{ApprovalStatus, Task, TaskId, TaskStatus, TaskType},
    ports::{
        TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskStatistics,
        TaskVisibility,
    },
};
use async_trait::async_trait;
use diesel::dsl::{count_distinct, count_star, exists};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed task store.
///
/// Implements both [`TaskRepository`] and
/// [`ClaimLedger`](crate::task::ports::ClaimLedger); claim admission relies
/// on `SELECT ... FOR UPDATE` on the task row.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(super) async fn run<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(
            move || {
                let mut connection = get_conn(&pool, TaskRepositoryError::persistence)?;
                f(&mut connection)
            },
            TaskRepositoryError::persistence,
        )
        .await
    }
}

/// Locks the task row and checks it is unclaimed and still in `expected`.
fn lock_unclaimed(
    connection: &mut PgConnection,
    task_id: TaskId,
    expected: TaskStatus,
) -> TaskRepositoryResult<()> {
    let stored_status = tasks::table
        .find(task_id.into_inner())
        .select(tasks::status)
        .for_update()
        .first::<String>(connection)
        .optional()?
        .ok_or(TaskRepositoryError::NotFound(task_id))?;
    if stored_status != expected.as_str() {
        return Err(TaskRepositoryError::StaleState { task_id, expected });
    }
    let has_claims = diesel::select(exists(
        task_claims::table.filter(task_claims::task_id.eq(task_id.into_inner())),
    ))
    .get_result::<bool>(connection)?;
    if has_claims {
        return Err(TaskRepositoryError::HasClaims(task_id));
    }
    Ok(())
}

fn tally_by<F>(
    rows: Vec<(String, i64)>,
    canonical: F,
) -> TaskRepositoryResult<std::collections::BTreeMap<&'static str, u64>>
where
    F: Fn(&str) -> TaskRepositoryResult<&'static str>,
{
    rows.into_iter()
        .map(|(key, count)| {
            let total = u64::try_from(count).map_err(TaskRepositoryError::persistence)?;
            Ok((canonical(&key)?, total))
        })
        .collect()
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let record = to_task_record(task)?;
        self.run(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&record)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>> {
        let filters = query.clone();
        let limit = filters
            .limit
            .map(i64::try_from)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?;
        self.run(move |connection| {
            let mut statement = tasks::table.select(TaskRow::as_select()).into_boxed();
            let approved = ApprovalStatus::Approved.as_str();
            statement = match filters.visibility {
                TaskVisibility::Everything => statement,
                TaskVisibility::PublishedOrCreatedBy(user_id) => statement.filter(
                    tasks::approval_status
                        .eq(approved)
                        .or(tasks::creator_id.eq(user_id.into_inner())),
                ),
                TaskVisibility::PublishedOnly => {
                    statement.filter(tasks::approval_status.eq(approved))
                }
            };
            if let Some(status) = filters.status {
                statement = statement.filter(tasks::status.eq(status.as_str()));
            }
            if let Some(task_type) = filters.task_type {
                statement = statement.filter(tasks::task_type.eq(task_type.as_str()));
            }
            if let Some(creator_id) = filters.creator_id {
                statement = statement.filter(tasks::creator_id.eq(creator_id.into_inner()));
            }
            if let Some(max_rows) = limit {
                statement = statement.limit(max_rows);
            }
            statement
                .order((
                    tasks::priority_level.desc(),
                    tasks::created_at.desc(),
                    tasks::id.asc(),
                ))
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn update_unclaimed(
        &self,
        task: &Task,
        expected: TaskStatus,
    ) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let record = to_task_record(task)?;
        self.run(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                lock_unclaimed(tx, task_id, expected)?;
                diesel::update(tasks::table.find(task_id.into_inner()))
                    .set(&record)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn delete_unclaimed(&self, id: TaskId, expected: TaskStatus) -> TaskRepositoryResult<()> {
        self.run(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                lock_unclaimed(tx, id, expected)?;
                diesel::delete(tasks::table.find(id.into_inner()))
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                            TaskRepositoryError::Referenced(id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn statistics(&self) -> TaskRepositoryResult<TaskStatistics> {
        self.run(|connection| {
            let status_rows = tasks::table
                .group_by(tasks::status)
                .select((tasks::status, count_star()))
                .load::<(String, i64)>(connection)?;
            let type_rows = tasks::table
                .group_by(tasks::task_type)
                .select((tasks::task_type, count_star()))
                .load::<(String, i64)>(connection)?;
            let pending_approval = tasks::table
                .filter(tasks::approval_status.eq(ApprovalStatus::Pending.as_str()))
                .count()
                .get_result::<i64>(connection)?;
            let active_volunteers = task_claims::table
                .filter(task_claims::status.eq_any(ACTIVE_CLAIM_STATUSES))
                .select(count_distinct(task_claims::user_id))
                .get_result::<i64>(connection)?;

            let by_status = tally_by(status_rows, |value| {
                TaskStatus::try_from(value)
                    .map(TaskStatus::as_str)
                    .map_err(TaskRepositoryError::persistence)
            })?;
            let by_type = tally_by(type_rows, |value| {
                TaskType::try_from(value)
                    .map(TaskType::as_str)
                    .map_err(TaskRepositoryError::persistence)
            })?;
            Ok(TaskStatistics {
                total: by_status.values().sum(),
                by_status,
                by_type,
                pending_approval: u64::from(count_to_u32(pending_approval)?),
                active_volunteers: u64::from(count_to_u32(active_volunteers)?),
            })
        })
        .await
    }
}
