//! In-memory integration tests for claim admission under concurrency.

use super::helpers::{Relief, relief};
use reliefhub::{
    access::domain::{Actor, Role},
    config::{AdmissionConfig, ReliefConfig},
    error::FailureKind,
    task::{
        domain::{Claim, ClaimStatus, TaskCascade, TaskStatus},
        services::ClaimAdmissionResult,
    },
};
use rstest::rstest;
use tokio::task::JoinSet;

async fn claim_concurrently(
    relief: &Relief,
    task_id: reliefhub::task::domain::TaskId,
    volunteers: &[Actor],
) -> eyre::Result<Vec<ClaimAdmissionResult<Claim>>> {
    let mut attempts = JoinSet::new();
    for volunteer in volunteers.iter().copied() {
        let claims = relief.claims.clone();
        attempts.spawn(async move { claims.claim(task_id, &volunteer, None).await });
    }
    let mut results = Vec::with_capacity(volunteers.len());
    while let Some(joined) = attempts.join_next().await {
        results.push(joined?);
    }
    Ok(results)
}

fn volunteers(relief: &Relief, count: usize) -> eyre::Result<Vec<Actor>> {
    (0..count).map(|_| relief.user(Role::Volunteer)).collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_volunteers_race_for_two_slots(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let task = relief.open_task(&organizer, 2).await?;
    let racers = volunteers(&relief, 3)?;

    let results = claim_concurrently(&relief, task.id(), &racers).await?;

    let admitted: Vec<&Claim> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    let refused: Vec<FailureKind> = results
        .iter()
        .filter_map(|result| result.as_ref().err().map(|err| err.kind()))
        .collect();
    eyre::ensure!(admitted.len() == 2, "expected two admissions, got {}", admitted.len());
    eyre::ensure!(
        admitted.iter().all(|claim| claim.status() == ClaimStatus::Claimed),
        "admitted claims should be in claimed status"
    );
    eyre::ensure!(refused == vec![FailureKind::CapacityExceeded], "refusals: {refused:?}");

    let stored = relief
        .tasks
        .find(task.id(), &organizer)
        .await?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    eyre::ensure!(stored.status() == TaskStatus::Claimed);
    eyre::ensure!(relief.claims.claims_for_task(task.id(), &organizer).await?.len() == 2);
    Ok(())
}

#[rstest]
#[case(1, 6)]
#[case(4, 10)]
#[case(5, 5)]
#[case(8, 3)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_min_of_attempts_and_capacity_succeed(
    relief: Relief,
    #[case] capacity: u32,
    #[case] attempts: usize,
) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let task = relief.open_task(&organizer, capacity).await?;
    let racers = volunteers(&relief, attempts)?;

    let results = claim_concurrently(&relief, task.id(), &racers).await?;

    let expected = attempts.min(usize::try_from(capacity)?);
    let admitted = results.iter().filter(|result| result.is_ok()).count();
    eyre::ensure!(admitted == expected, "admitted {admitted}, expected {expected}");
    eyre::ensure!(
        results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| err.kind() == FailureKind::CapacityExceeded),
        "every loser should observe a capacity failure"
    );
    eyre::ensure!(relief.events.names().len() == expected);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_volunteer_racing_itself_holds_one_claim(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let task = relief.open_task(&organizer, 5).await?;
    let volunteer = relief.user(Role::Volunteer)?;

    let results = claim_concurrently(&relief, task.id(), &[volunteer; 4]).await?;

    let kinds: Vec<FailureKind> = results
        .iter()
        .filter_map(|result| result.as_ref().err().map(|err| err.kind()))
        .collect();
    eyre::ensure!(results.iter().filter(|result| result.is_ok()).count() == 1);
    eyre::ensure!(kinds.iter().all(|kind| *kind == FailureKind::AlreadyClaimed));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn per_user_limit_holds_across_tasks_under_concurrency(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let mut tasks = Vec::new();
    for _ in 0..5 {
        tasks.push(relief.open_task(&organizer, 2).await?);
    }

    let mut attempts = JoinSet::new();
    for task in &tasks {
        let claims = relief.claims.clone();
        let task_id = task.id();
        attempts.spawn(async move { claims.claim(task_id, &volunteer, None).await });
    }
    let mut admitted = 0;
    while let Some(joined) = attempts.join_next().await {
        match joined? {
            Ok(_) => admitted += 1,
            Err(err) => eyre::ensure!(err.kind() == FailureKind::CapacityExceeded),
        }
    }

    eyre::ensure!(admitted == 3, "admitted {admitted} claims past the limit");
    let held = relief.claims.claims_for_user(volunteer.id(), None).await?;
    eyre::ensure!(held.iter().filter(|claim| claim.is_active()).count() == 3);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_every_claim_completes_the_task(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let task = relief.open_task(&organizer, 2).await?;
    let first = relief.user(Role::Volunteer)?;
    let second = relief.user(Role::Volunteer)?;
    let first_claim = relief.claims.claim(task.id(), &first, None).await?;
    let second_claim = relief.claims.claim(task.id(), &second, None).await?;

    let started = relief
        .claims
        .update_claim_status(first_claim.id(), ClaimStatus::Started, &first, None)
        .await?;
    eyre::ensure!(started.cascade == Some(TaskCascade::Started));
    eyre::ensure!(started.task.status() == TaskStatus::InProgress);

    let released = relief
        .claims
        .update_claim_status(second_claim.id(), ClaimStatus::Cancelled, &second, None)
        .await?;
    eyre::ensure!(released.cascade == Some(TaskCascade::Reopened));
    eyre::ensure!(released.task.status() == TaskStatus::Available);

    let done = relief
        .claims
        .update_claim_status(
            first_claim.id(),
            ClaimStatus::Completed,
            &first,
            Some("hall is clear".to_owned()),
        )
        .await?;
    eyre::ensure!(done.cascade == Some(TaskCascade::Completed));
    eyre::ensure!(done.task.status() == TaskStatus::Completed);
    eyre::ensure!(done.claim.notes() == Some("hall is clear"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn full_tasks_stay_claimed_when_reopening_is_disabled() -> eyre::Result<()> {
    let relief = Relief::with_config(&ReliefConfig {
        admission: AdmissionConfig {
            reopen_on_release: false,
            ..AdmissionConfig::default()
        },
    });
    let organizer = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let task = relief.open_task(&organizer, 1).await?;
    let claim = relief.claims.claim(task.id(), &volunteer, None).await?;

    let released = relief
        .claims
        .update_claim_status(claim.id(), ClaimStatus::Cancelled, &volunteer, None)
        .await?;

    eyre::ensure!(released.cascade.is_none());
    eyre::ensure!(released.task.status() == TaskStatus::Claimed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn released_slots_can_be_claimed_again(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let task = relief.open_task(&organizer, 1).await?;
    let claim = relief.claims.claim(task.id(), &volunteer, None).await?;
    relief
        .claims
        .update_claim_status(claim.id(), ClaimStatus::Cancelled, &volunteer, None)
        .await?;

    let again = relief.claims.claim_with_retry(task.id(), &volunteer, None).await?;
    eyre::ensure!(again.id() != claim.id());
    let report = relief.claims.check_conflicts(task.id(), volunteer.id()).await?;
    eyre::ensure!(report.has_conflicts());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unapproved_task_is_invalid_state_even_at_the_user_limit(
    relief: Relief,
) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    for _ in 0..3 {
        let task = relief.open_task(&organizer, 2).await?;
        relief.claims.claim(task.id(), &volunteer, None).await?;
    }
    let grassroots = relief.user(Role::UnofficialOrganization)?;
    let pending = relief.open_task(&grassroots, 2).await?;
    eyre::ensure!(pending.status() == TaskStatus::Pending);

    let err = relief
        .claims
        .claim(pending.id(), &volunteer, None)
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("claim on a pending task should be refused"))?;
    eyre::ensure!(
        err.kind() == FailureKind::InvalidState,
        "unexpected kind {:?}",
        err.kind()
    );
    eyre::ensure!(err.report().is_some_and(|report| report.reasons().len() == 2));
    Ok(())
}
