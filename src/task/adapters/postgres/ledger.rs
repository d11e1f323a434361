//! `PostgreSQL` implementation of [`ClaimLedger`].
//!
//! Admission and claim transitions run in one transaction each. The task row
//! is locked with `SELECT ... FOR UPDATE`; admission then takes a
//! transaction-scoped advisory lock keyed on the claiming user. Both waits
//! are bounded by `SET LOCAL lock_timeout`.

use super::{
    mapping::{
        ACTIVE_CLAIM_STATUSES, classify, count_to_u32, row_to_claim, row_to_task,
        to_claim_record,
    },
    models::{ClaimRow, TaskRow},
    repository::PostgresTaskRepository,
    schema::{task_claims, tasks},
};
use crate::access::domain::UserId;
use crate::task::{
    domain::{
        AdmissionSnapshot, AdmissionTaskState, Claim, ClaimId, ClaimStatus, ClaimTally,
        ConflictReport, Task, TaskId,
    },
    ports::{
        AdmissionOutcome, AdmissionRequest, ClaimLedger, ClaimTransition, TaskRepositoryError,
        TaskRepositoryResult, TransitionOutcome,
    },
};
use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use std::time::Duration;

fn set_lock_timeout(
    connection: &mut PgConnection,
    timeout: Duration,
    task_id: TaskId,
) -> TaskRepositoryResult<()> {
    let millis = timeout.as_millis().max(1);
    diesel::sql_query(format!("SET LOCAL lock_timeout = '{millis}ms'"))
        .execute(connection)
        .map_err(|err| classify(err, task_id))?;
    Ok(())
}

fn lock_task(connection: &mut PgConnection, task_id: TaskId) -> TaskRepositoryResult<Option<Task>> {
    tasks::table
        .find(task_id.into_inner())
        .select(TaskRow::as_select())
        .for_update()
        .first::<TaskRow>(connection)
        .optional()
        .map_err(|err| classify(err, task_id))?
        .map(row_to_task)
        .transpose()
}

fn lock_user(
    connection: &mut PgConnection,
    user_id: UserId,
    task_id: TaskId,
) -> TaskRepositoryResult<()> {
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind::<Text, _>(user_id.to_string())
        .execute(connection)
        .map_err(|err| classify(err, task_id))?;
    Ok(())
}

fn read_snapshot(
    connection: &mut PgConnection,
    task: Option<AdmissionTaskState>,
    task_id: TaskId,
    user_id: UserId,
) -> TaskRepositoryResult<AdmissionSnapshot> {
    let active_on_task = task_claims::table
        .filter(task_claims::status.eq_any(ACTIVE_CLAIM_STATUSES))
        .filter(task_claims::task_id.eq(task_id.into_inner()))
        .count()
        .get_result::<i64>(connection)?;
    let user_holds_claim = diesel::select(exists(
        task_claims::table
            .filter(task_claims::status.eq_any(ACTIVE_CLAIM_STATUSES))
            .filter(task_claims::task_id.eq(task_id.into_inner()))
            .filter(task_claims::user_id.eq(user_id.into_inner())),
    ))
    .get_result::<bool>(connection)?;
    let active_for_user = task_claims::table
        .filter(task_claims::status.eq_any(ACTIVE_CLAIM_STATUSES))
        .filter(task_claims::user_id.eq(user_id.into_inner()))
        .count()
        .get_result::<i64>(connection)?;

    Ok(AdmissionSnapshot {
        task_id,
        user_id,
        task,
        active_on_task: count_to_u32(active_on_task)?,
        user_holds_claim,
        active_for_user: count_to_u32(active_for_user)?,
    })
}

fn admission_state(task: &Task) -> AdmissionTaskState {
    AdmissionTaskState {
        status: task.status(),
        capacity: task.capacity(),
    }
}

fn write_task_progress(connection: &mut PgConnection, task: &Task) -> TaskRepositoryResult<()> {
    diesel::update(tasks::table.find(task.id().into_inner()))
        .set((
            tasks::status.eq(task.status().as_str()),
            tasks::updated_at.eq(task.updated_at()),
        ))
        .execute(connection)
        .map_err(|err| classify(err, task.id()))?;
    Ok(())
}

fn tally_claims(connection: &mut PgConnection, task_id: TaskId) -> TaskRepositoryResult<ClaimTally> {
    let statuses = task_claims::table
        .filter(task_claims::task_id.eq(task_id.into_inner()))
        .select(task_claims::status)
        .load::<String>(connection)?
        .iter()
        .map(|value| ClaimStatus::try_from(value.as_str()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(TaskRepositoryError::persistence)?;
    Ok(ClaimTally::from_statuses(statuses))
}

fn admit_in_transaction(
    connection: &mut PgConnection,
    request: &AdmissionRequest,
) -> TaskRepositoryResult<AdmissionOutcome> {
    let candidate = &request.candidate;
    let task_id = candidate.task_id();
    let user_id = candidate.user_id();

    set_lock_timeout(connection, request.lock_timeout, task_id)?;
    let locked = lock_task(connection, task_id)?;
    lock_user(connection, user_id, task_id)?;

    let snapshot = read_snapshot(connection, locked.as_ref().map(admission_state), task_id, user_id)?;
    let report = ConflictReport::evaluate(&snapshot, request.rules);
    let Some(mut task) = locked.filter(|_| !report.has_conflicts()) else {
        return Ok(AdmissionOutcome::Rejected(report));
    };

    diesel::insert_into(task_claims::table)
        .values(&to_claim_record(candidate))
        .execute(connection)
        .map_err(|err| classify(err, task_id))?;
    task.record_admission(snapshot.active_on_task + 1, candidate.claimed_at());
    write_task_progress(connection, &task)?;

    Ok(AdmissionOutcome::Admitted {
        claim: candidate.clone(),
        task,
    })
}

fn transition_in_transaction(
    connection: &mut PgConnection,
    transition: &ClaimTransition,
) -> TaskRepositoryResult<TransitionOutcome> {
    let claim = &transition.claim;
    let task_id = claim.task_id();

    set_lock_timeout(connection, transition.lock_timeout, task_id)?;
    let mut task = lock_task(connection, task_id)?.ok_or(TaskRepositoryError::NotFound(task_id))?;

    let written = diesel::update(
        task_claims::table
            .filter(task_claims::id.eq(claim.id().into_inner()))
            .filter(task_claims::status.eq(transition.expected.as_str())),
    )
    .set(&to_claim_record(claim))
    .execute(connection)
    .map_err(|err| classify(err, task_id))?;
    if written == 0 {
        let claim_exists = diesel::select(exists(
            task_claims::table.filter(task_claims::id.eq(claim.id().into_inner())),
        ))
        .get_result::<bool>(connection)?;
        return Err(if claim_exists {
            TaskRepositoryError::StaleClaim {
                claim_id: claim.id(),
                expected: transition.expected,
            }
        } else {
            TaskRepositoryError::ClaimNotFound(claim.id())
        });
    }

    let tally = tally_claims(connection, task_id)?;
    let cascade = task.settle_claims(
        claim.status(),
        &tally,
        transition.reopen_on_release,
        claim.updated_at(),
    );
    if cascade.is_some() {
        write_task_progress(connection, &task)?;
    }

    Ok(TransitionOutcome {
        claim: claim.clone(),
        task,
        cascade,
    })
}

#[async_trait]
impl ClaimLedger for PostgresTaskRepository {
    async fn admission_snapshot(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskRepositoryResult<AdmissionSnapshot> {
        self.run(move |connection| {
            let task = tasks::table
                .find(task_id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?
                .map(row_to_task)
                .transpose()?;
            read_snapshot(connection, task.as_ref().map(admission_state), task_id, user_id)
        })
        .await
    }

    async fn admit(&self, request: AdmissionRequest) -> TaskRepositoryResult<AdmissionOutcome> {
        self.run(move |connection| {
            connection
                .transaction::<_, TaskRepositoryError, _>(|tx| admit_in_transaction(tx, &request))
        })
        .await
    }

    async fn find_claim(&self, id: ClaimId) -> TaskRepositoryResult<Option<Claim>> {
        self.run(move |connection| {
            task_claims::table
                .find(id.into_inner())
                .select(ClaimRow::as_select())
                .first::<ClaimRow>(connection)
                .optional()?
                .map(row_to_claim)
                .transpose()
        })
        .await
    }

    async fn apply_transition(
        &self,
        transition: ClaimTransition,
    ) -> TaskRepositoryResult<TransitionOutcome> {
        self.run(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                transition_in_transaction(tx, &transition)
            })
        })
        .await
    }

    async fn claims_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Claim>> {
        self.run(move |connection| {
            task_claims::table
                .filter(task_claims::task_id.eq(task_id.into_inner()))
                .order((task_claims::claimed_at.asc(), task_claims::id.asc()))
                .select(ClaimRow::as_select())
                .load::<ClaimRow>(connection)?
                .into_iter()
                .map(row_to_claim)
                .collect()
        })
        .await
    }

    async fn claims_for_user(
        &self,
        user_id: UserId,
        status: Option<ClaimStatus>,
    ) -> TaskRepositoryResult<Vec<Claim>> {
        self.run(move |connection| {
            let mut statement = task_claims::table
                .select(ClaimRow::as_select())
                .filter(task_claims::user_id.eq(user_id.into_inner()))
                .into_boxed();
            if let Some(wanted) = status {
                statement = statement.filter(task_claims::status.eq(wanted.as_str()));
            }
            statement
                .order((task_claims::claimed_at.desc(), task_claims::id.asc()))
                .load::<ClaimRow>(connection)?
                .into_iter()
                .map(row_to_claim)
                .collect()
        })
        .await
    }
}
