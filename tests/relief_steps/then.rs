//! Then steps for relief operation scenarios.

use super::world::{ReliefWorld, run_async};
use reliefhub::error::FailureKind;
use rstest_bdd_macros::then;

#[then("{count:usize} claims are admitted")]
fn claims_admitted(world: &ReliefWorld, count: usize) -> Result<(), eyre::Report> {
    let admitted = world
        .claim_results
        .iter()
        .filter(|result| result.is_ok())
        .count();
    eyre::ensure!(admitted == count, "expected {count} admissions, got {admitted}");
    Ok(())
}

#[then(r#"{count:usize} claims fail with "{kind}""#)]
fn claims_fail_with(world: &ReliefWorld, count: usize, kind: String) -> Result<(), eyre::Report> {
    let failures: Vec<FailureKind> = world
        .claim_results
        .iter()
        .filter_map(|result| result.as_ref().err().copied())
        .collect();
    eyre::ensure!(
        failures.len() == count && failures.iter().all(|failure| failure.as_str() == kind),
        "expected {count} {kind} failures, got {failures:?}"
    );
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ReliefWorld, status: String) -> Result<(), eyre::Report> {
    let organizer = world.organizer()?;
    let task = run_async(world.tasks.find(world.task()?.id(), &organizer))?
        .ok_or_else(|| eyre::eyre!("scenario task disappeared"))?;
    eyre::ensure!(
        task.status().as_str() == status,
        "expected task status {status}, found {}",
        task.status()
    );
    Ok(())
}

#[then("the task is not listed as available")]
fn task_not_available(world: &ReliefWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let available = run_async(world.tasks.list_available())?;
    eyre::ensure!(
        available.iter().all(|task| task.id() != task_id),
        "pending task leaked into the available listing"
    );
    Ok(())
}

#[then("the task is listed as available")]
fn task_available(world: &ReliefWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let available = run_async(world.tasks.list_available())?;
    eyre::ensure!(
        available.iter().any(|task| task.id() == task_id),
        "approved task missing from the available listing"
    );
    Ok(())
}

#[then(r#"the operation fails with "{kind}""#)]
fn operation_fails_with(world: &ReliefWorld, kind: String) -> Result<(), eyre::Report> {
    let failure = world
        .last_failure
        .ok_or_else(|| eyre::eyre!("expected the operation to fail"))?;
    eyre::ensure!(failure.as_str() == kind, "expected {kind}, got {failure}");
    Ok(())
}

#[then(r#"the need status is "{status}""#)]
fn need_status_is(world: &ReliefWorld, status: String) -> Result<(), eyre::Report> {
    let need = world.need()?;
    eyre::ensure!(
        need.status().as_str() == status,
        "expected need status {status}, found {}",
        need.status()
    );
    Ok(())
}

#[then("the need is assigned to the volunteer")]
fn need_assigned_to_volunteer(world: &ReliefWorld) -> Result<(), eyre::Report> {
    let volunteer = world.volunteer()?;
    eyre::ensure!(world.need()?.assigned_to() == Some(volunteer.id()));
    Ok(())
}

#[then("the need has a resolution time")]
fn need_has_resolution_time(world: &ReliefWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(world.need()?.resolved_at().is_some());
    Ok(())
}
