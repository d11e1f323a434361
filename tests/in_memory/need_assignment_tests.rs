//! In-memory integration tests for need assignment and resolution.

use super::helpers::{Relief, relief};
use reliefhub::{
    access::domain::Role,
    error::FailureKind,
    events::ReliefEvent,
    need::{
        domain::{AssignmentStatus, NeedStatus, NeedType},
        ports::NeedQuery,
        services::{CreateNeedRequest, NeedAssignmentRequest},
    },
};
use rstest::rstest;

fn shelter_request(urgency: u8) -> CreateNeedRequest {
    CreateNeedRequest::new(
        "Family of four needs shelter",
        "House flooded to first floor",
        NeedType::Shelter,
        "22 Canal Row",
    )
    .with_urgency(urgency)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn urgent_need_is_assigned_and_resolved(relief: Relief) -> eyre::Result<()> {
    let victim = relief.user(Role::Victim)?;
    let admin = relief.user(Role::Administrator)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let need = relief.needs.create(shelter_request(5), &victim).await?;
    eyre::ensure!(need.status() == NeedStatus::Open);

    let assigned = relief
        .needs
        .assign(need.id(), NeedAssignmentRequest::new(volunteer.id()), &admin)
        .await?;
    eyre::ensure!(assigned.status() == NeedStatus::Assigned);
    eyre::ensure!(assigned.assigned_to() == Some(volunteer.id()));

    let resolved = relief.needs.resolve(need.id(), &volunteer, None).await?;
    eyre::ensure!(resolved.status() == NeedStatus::Resolved);
    eyre::ensure!(resolved.resolved_at().is_some());

    eyre::ensure!(
        relief.events.events()
            == vec![
                ReliefEvent::NeedAssigned {
                    need_id: need.id(),
                    assignee_id: volunteer.id(),
                    assigned_by: admin.id(),
                },
                ReliefEvent::NeedResolved {
                    need_id: need.id(),
                    reporter_id: victim.id(),
                    assignee_id: Some(volunteer.id()),
                },
            ],
        "unexpected events: {:?}",
        relief.events.names()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assign_then_unassign_restores_an_open_need(relief: Relief) -> eyre::Result<()> {
    let victim = relief.user(Role::Victim)?;
    let coordinator = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let need = relief.needs.create(shelter_request(3), &victim).await?;

    relief
        .needs
        .assign(need.id(), NeedAssignmentRequest::new(volunteer.id()), &coordinator)
        .await?;
    let restored = relief.needs.unassign(need.id(), &coordinator).await?;

    eyre::ensure!(restored.status() == NeedStatus::Open);
    eyre::ensure!(restored.assigned_to().is_none());
    eyre::ensure!(restored.assigned_at().is_none());
    eyre::ensure!(restored.content() == need.content());

    let trail = relief.needs.assignments(need.id(), &coordinator).await?;
    eyre::ensure!(trail.len() == 1, "the audit record survives unassignment");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignments_can_reference_a_task(relief: Relief) -> eyre::Result<()> {
    let victim = relief.user(Role::Victim)?;
    let coordinator = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let task = relief.open_task(&coordinator, 2).await?;
    let need = relief.needs.create(shelter_request(4), &victim).await?;

    relief
        .needs
        .assign(
            need.id(),
            NeedAssignmentRequest::new(volunteer.id()).with_task(task.id()),
            &coordinator,
        )
        .await?;
    relief.needs.start(need.id(), &volunteer, Some("en route".to_owned())).await?;
    relief.needs.resolve(need.id(), &victim, None).await?;

    let trail = relief.needs.assignments(need.id(), &victim).await?;
    let statuses: Vec<AssignmentStatus> = trail.iter().map(|record| record.status()).collect();
    eyre::ensure!(
        statuses
            == vec![
                AssignmentStatus::Assigned,
                AssignmentStatus::InProgress,
                AssignmentStatus::Completed,
            ]
    );
    eyre::ensure!(trail.first().and_then(|record| record.task_id()) == Some(task.id()));
    eyre::ensure!(trail.iter().all(|record| record.assignee_id() == volunteer.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_assignments_admit_one_assignee(relief: Relief) -> eyre::Result<()> {
    let victim = relief.user(Role::Victim)?;
    let coordinator = relief.user(Role::OfficialOrganization)?;
    let need = relief.needs.create(shelter_request(5), &victim).await?;

    let mut attempts = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let needs = relief.needs.clone();
        let volunteer = relief.user(Role::Volunteer)?;
        let need_id = need.id();
        attempts.spawn(async move {
            needs
                .assign(need_id, NeedAssignmentRequest::new(volunteer.id()), &coordinator)
                .await
        });
    }
    let mut assigned = 0;
    while let Some(joined) = attempts.join_next().await {
        match joined? {
            Ok(_) => assigned += 1,
            Err(err) => eyre::ensure!(err.kind() == FailureKind::InvalidState),
        }
    }

    eyre::ensure!(assigned == 1, "{assigned} assignees won the same need");
    eyre::ensure!(relief.needs.assignments(need.id(), &coordinator).await?.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn needs_list_most_urgent_first(relief: Relief) -> eyre::Result<()> {
    let victim = relief.user(Role::Victim)?;
    let coordinator = relief.user(Role::OfficialOrganization)?;
    let low = relief.needs.create(shelter_request(1), &victim).await?;
    let high = relief.needs.create(shelter_request(5), &victim).await?;
    let medium = relief.needs.create(shelter_request(3), &victim).await?;

    let listed = relief.needs.list(NeedQuery::default(), &coordinator).await?;
    let ids: Vec<_> = listed.iter().map(|need| need.id()).collect();
    eyre::ensure!(ids == vec![high.id(), medium.id(), low.id()]);

    let urgent = relief
        .needs
        .list(
            NeedQuery {
                min_urgency: Some(3),
                limit: Some(1),
                ..NeedQuery::default()
            },
            &coordinator,
        )
        .await?;
    eyre::ensure!(urgent.iter().map(|need| need.id()).eq([high.id()]));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_linked_to_assignments_cannot_be_deleted(relief: Relief) -> eyre::Result<()> {
    let victim = relief.user(Role::Victim)?;
    let coordinator = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let linked = relief.open_task(&coordinator, 2).await?;
    let unlinked = relief.open_task(&coordinator, 2).await?;
    let need = relief.needs.create(shelter_request(4), &victim).await?;
    relief
        .needs
        .assign(
            need.id(),
            NeedAssignmentRequest::new(volunteer.id()).with_task(linked.id()),
            &coordinator,
        )
        .await?;

    let Err(err) = relief.tasks.delete(linked.id(), &coordinator).await else {
        eyre::bail!("a task named by an assignment must survive deletion");
    };
    eyre::ensure!(err.kind() == FailureKind::InvalidState, "unexpected failure: {err}");
    eyre::ensure!(relief.tasks.find(linked.id(), &coordinator).await?.is_some());

    relief.tasks.delete(unlinked.id(), &coordinator).await?;
    eyre::ensure!(relief.tasks.find(unlinked.id(), &coordinator).await?.is_none());
    Ok(())
}
