//! Row-locked claim admission against `PostgreSQL`.

use super::helpers::{BoxError, PgRelief};
use reliefhub::{
    access::domain::Role,
    error::FailureKind,
    task::domain::{ClaimStatus, TaskCascade, TaskPatch, TaskStatus},
};
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL"]
async fn concurrent_claims_never_exceed_capacity() -> Result<(), BoxError> {
    let relief = PgRelief::create().await?;
    let organizer = relief.user(Role::OfficialOrganization).await?;
    let task = relief.open_task(&organizer, 2).await?;

    let mut attempts = JoinSet::new();
    for _ in 0..6 {
        let volunteer = relief.user(Role::Volunteer).await?;
        let claims = relief.claims.clone();
        let task_id = task.id();
        attempts.spawn(async move { claims.claim_with_retry(task_id, &volunteer, None).await });
    }
    let mut admitted = 0;
    let mut refused = Vec::new();
    while let Some(joined) = attempts.join_next().await {
        match joined? {
            Ok(_) => admitted += 1,
            Err(err) => refused.push(err.kind()),
        }
    }

    assert_eq!(admitted, 2);
    assert!(
        refused.iter().all(|kind| *kind == FailureKind::CapacityExceeded),
        "refusals: {refused:?}"
    );
    let stored = relief
        .tasks
        .find(task.id(), &organizer)
        .await?
        .ok_or("task should exist")?;
    assert_eq!(stored.status(), TaskStatus::Claimed);
    assert_eq!(
        relief
            .claims
            .claims_for_task(task.id(), &organizer)
            .await?
            .len(),
        2
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL"]
async fn duplicate_claims_are_refused() -> Result<(), BoxError> {
    let relief = PgRelief::create().await?;
    let organizer = relief.user(Role::SupplyManager).await?;
    let volunteer = relief.user(Role::Volunteer).await?;
    let task = relief.open_task(&organizer, 3).await?;
    relief.claims.claim(task.id(), &volunteer, None).await?;

    let err = relief
        .claims
        .claim(task.id(), &volunteer, None)
        .await
        .err()
        .ok_or("second claim should be refused")?;
    assert_eq!(err.kind(), FailureKind::AlreadyClaimed);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL"]
async fn claim_transitions_cascade_in_one_write() -> Result<(), BoxError> {
    let relief = PgRelief::create().await?;
    let organizer = relief.user(Role::OfficialOrganization).await?;
    let first = relief.user(Role::Volunteer).await?;
    let second = relief.user(Role::Volunteer).await?;
    let task = relief.open_task(&organizer, 2).await?;
    let first_claim = relief.claims.claim(task.id(), &first, None).await?;
    let second_claim = relief.claims.claim(task.id(), &second, None).await?;

    let started = relief
        .claims
        .update_claim_status(first_claim.id(), ClaimStatus::Started, &first, None)
        .await?;
    assert_eq!(started.cascade, Some(TaskCascade::Started));

    let released = relief
        .claims
        .update_claim_status(second_claim.id(), ClaimStatus::Cancelled, &second, None)
        .await?;
    assert_eq!(released.cascade, Some(TaskCascade::Reopened));
    assert_eq!(released.task.status(), TaskStatus::Available);

    let done = relief
        .claims
        .update_claim_status(first_claim.id(), ClaimStatus::Completed, &first, None)
        .await?;
    assert_eq!(done.cascade, Some(TaskCascade::Completed));

    let stored = relief
        .tasks
        .find(task.id(), &organizer)
        .await?
        .ok_or("task should exist")?;
    assert_eq!(stored.status(), TaskStatus::Completed);
    assert_eq!(
        relief.events.names(),
        vec![
            "task_claimed",
            "task_claimed",
            "task_status_cascaded",
            "task_status_cascaded",
            "claim_completed",
            "task_status_cascaded",
        ]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL"]
async fn claimed_tasks_refuse_edits_and_deletes() -> Result<(), BoxError> {
    let relief = PgRelief::create().await?;
    let organizer = relief.user(Role::OfficialOrganization).await?;
    let volunteer = relief.user(Role::Volunteer).await?;
    let task = relief.open_task(&organizer, 2).await?;
    let claim = relief.claims.claim(task.id(), &volunteer, None).await?;
    relief
        .claims
        .update_claim_status(claim.id(), ClaimStatus::Cancelled, &volunteer, None)
        .await?;

    let patch = TaskPatch {
        priority: Some(5),
        ..TaskPatch::default()
    };
    let update = relief
        .tasks
        .update(task.id(), patch, &organizer)
        .await
        .err()
        .ok_or("a task with claim history should not be editable")?;
    let delete = relief
        .tasks
        .delete(task.id(), &organizer)
        .await
        .err()
        .ok_or("a task with claim history should not be deletable")?;
    assert_eq!(update.kind(), FailureKind::InvalidState);
    assert_eq!(delete.kind(), FailureKind::InvalidState);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL"]
async fn unclaimed_tasks_round_trip_through_storage() -> Result<(), BoxError> {
    let relief = PgRelief::create().await?;
    let organizer = relief.user(Role::OfficialOrganization).await?;
    let task = relief.open_task(&organizer, 4).await?;

    let stored = relief
        .tasks
        .find(task.id(), &organizer)
        .await?
        .ok_or("task should exist")?;
    assert_eq!(stored.details(), task.details());
    assert_eq!(stored.status(), TaskStatus::Available);

    relief.tasks.delete(task.id(), &organizer).await?;
    assert!(relief.tasks.find(task.id(), &organizer).await?.is_none());
    Ok(())
}
