//! Given steps for relief operation scenarios.

use super::world::{ReliefWorld, run_async};
use eyre::WrapErr;
use reliefhub::{
    access::domain::{Actor, Role},
    need::{domain::NeedType, services::CreateNeedRequest},
    task::{domain::TaskType, services::CreateTaskRequest},
};
use rstest_bdd_macros::given;

fn submit_task(
    world: &mut ReliefWorld,
    creator: Actor,
    capacity: u32,
) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(
        "Sandbag the river wall",
        "Bags and sand at the depot",
        TaskType::Rescue,
        "River Walk",
    )
    .with_required_volunteers(capacity);
    let task = run_async(world.tasks.create(request, &creator)).wrap_err("create scenario task")?;
    world.organizer = Some(creator);
    world.task = Some(task);
    Ok(())
}

#[given("an official organization has published a task needing {capacity:u32} volunteers")]
fn official_task(world: &mut ReliefWorld, capacity: u32) -> Result<(), eyre::Report> {
    let creator = world.register(Role::OfficialOrganization)?;
    submit_task(world, creator, capacity)
}

#[given("an unofficial organization has submitted a task needing {capacity:u32} volunteers")]
fn unofficial_task(world: &mut ReliefWorld, capacity: u32) -> Result<(), eyre::Report> {
    let creator = world.register(Role::UnofficialOrganization)?;
    submit_task(world, creator, capacity)
}

#[given("a volunteer has claimed the task")]
fn volunteer_claimed(world: &mut ReliefWorld) -> Result<(), eyre::Report> {
    let volunteer = world.register(Role::Volunteer)?;
    let task_id = world.task()?.id();
    run_async(world.claims.claim(task_id, &volunteer, None)).wrap_err("claim scenario task")?;
    world.volunteer = Some(volunteer);
    Ok(())
}

#[given("a victim has reported a need with urgency {urgency:u8}")]
fn victim_need(world: &mut ReliefWorld, urgency: u8) -> Result<(), eyre::Report> {
    let victim = world.register(Role::Victim)?;
    let request = CreateNeedRequest::new(
        "Elderly resident trapped upstairs",
        "Water at ground floor windows",
        NeedType::Rescue,
        "5 Ferry Lane",
    )
    .with_urgency(urgency);
    let need = run_async(world.needs.create(request, &victim)).wrap_err("report scenario need")?;
    world.need = Some(need);
    Ok(())
}
