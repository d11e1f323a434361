//! When steps for relief operation scenarios.

use super::world::{ReliefWorld, run_async};
use eyre::WrapErr;
use reliefhub::{
    access::domain::Role,
    need::services::NeedAssignmentRequest,
    task::domain::TaskPatch,
};
use rstest_bdd_macros::when;
use tokio::task::JoinSet;

#[when("{count:usize} volunteers claim the task at the same time")]
fn volunteers_claim(world: &mut ReliefWorld, count: usize) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let mut attempts = JoinSet::new();
    for _ in 0..count {
        let volunteer = world.register(Role::Volunteer)?;
        let claims = world.claims.clone();
        attempts.spawn(async move {
            claims
                .claim(task_id, &volunteer, None)
                .await
                .map_err(|err| err.kind())
        });
    }
    world.claim_results = run_async(async move {
        let mut results = Vec::new();
        while let Some(joined) = attempts.join_next().await {
            results.push(joined?);
        }
        Ok::<_, tokio::task::JoinError>(results)
    })?;
    Ok(())
}

#[when("the organization edits the task")]
fn organization_edits(world: &mut ReliefWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let organizer = world.organizer()?;
    let patch = TaskPatch {
        description: Some("Bring your own shovel".to_owned()),
        ..TaskPatch::default()
    };
    world.last_failure = run_async(world.tasks.update(task_id, patch, &organizer))
        .err()
        .map(|err| err.kind());
    Ok(())
}

#[when("the organization deletes the task")]
fn organization_deletes(world: &mut ReliefWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let organizer = world.organizer()?;
    world.last_failure = run_async(world.tasks.delete(task_id, &organizer))
        .err()
        .map(|err| err.kind());
    Ok(())
}

#[when("an administrator approves the task")]
fn administrator_approves(world: &mut ReliefWorld) -> Result<(), eyre::Report> {
    let admin = world.register(Role::Administrator)?;
    let task_id = world.task()?.id();
    let approved = run_async(world.tasks.approve(task_id, &admin, true, None))
        .wrap_err("approve scenario task")?;
    world.task = Some(approved);
    Ok(())
}

#[when("an administrator assigns the need to a volunteer")]
fn administrator_assigns(world: &mut ReliefWorld) -> Result<(), eyre::Report> {
    let admin = world.register(Role::Administrator)?;
    let volunteer = world.register(Role::Volunteer)?;
    let need_id = world.need()?.id();
    let assigned = run_async(world.needs.assign(
        need_id,
        NeedAssignmentRequest::new(volunteer.id()),
        &admin,
    ))
    .wrap_err("assign scenario need")?;
    world.volunteer = Some(volunteer);
    world.need = Some(assigned);
    Ok(())
}

#[when("the volunteer resolves the need")]
fn volunteer_resolves(world: &mut ReliefWorld) -> Result<(), eyre::Report> {
    let volunteer = world.volunteer()?;
    let need_id = world.need()?.id();
    let resolved = run_async(world.needs.resolve(need_id, &volunteer, None))
        .wrap_err("resolve scenario need")?;
    world.need = Some(resolved);
    Ok(())
}
