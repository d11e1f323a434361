//! In-memory integration tests for task creation, review, and editing.

use super::helpers::{Relief, relief};
use reliefhub::{
    access::domain::Role,
    error::FailureKind,
    task::{
        domain::{ApprovalStatus, TaskPatch, TaskStatus, TaskType},
        services::CreateTaskRequest,
    },
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unofficial_tasks_stay_hidden_until_approved(relief: Relief) -> eyre::Result<()> {
    let community_group = relief.user(Role::UnofficialOrganization)?;
    let admin = relief.user(Role::Administrator)?;
    let volunteer = relief.user(Role::Volunteer)?;

    let pending = relief.open_task(&community_group, 2).await?;
    eyre::ensure!(pending.status() == TaskStatus::Pending);
    eyre::ensure!(pending.approval_status() == ApprovalStatus::Pending);
    eyre::ensure!(relief.tasks.list_available().await?.is_empty());
    eyre::ensure!(relief.tasks.find(pending.id(), &volunteer).await?.is_none());

    let refused = relief
        .claims
        .claim(pending.id(), &volunteer, None)
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("pending task should not be claimable"))?;
    eyre::ensure!(refused.kind() == FailureKind::InvalidState);

    let approved = relief
        .tasks
        .approve(pending.id(), &admin, true, Some("checked".to_owned()))
        .await?;
    eyre::ensure!(approved.status() == TaskStatus::Available);
    eyre::ensure!(
        approved.review().map(|review| review.reviewer_id) == Some(admin.id()),
        "approver should be recorded"
    );

    let available = relief.tasks.list_available().await?;
    eyre::ensure!(available.iter().map(|task| task.id()).eq([pending.id()]));

    let second_review = relief
        .tasks
        .approve(pending.id(), &admin, false, None)
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("approval should not be idempotent"))?;
    eyre::ensure!(second_review.kind() == FailureKind::InvalidState);
    eyre::ensure!(
        relief.events.names()
            == vec!["task_approval_requested", "task_approved"],
        "unexpected events: {:?}",
        relief.events.names()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_tasks_are_cancelled(relief: Relief) -> eyre::Result<()> {
    let community_group = relief.user(Role::UnofficialOrganization)?;
    let admin = relief.user(Role::Administrator)?;
    let pending = relief.open_task(&community_group, 1).await?;

    let rejected = relief
        .tasks
        .approve(pending.id(), &admin, false, Some("duplicate".to_owned()))
        .await?;

    eyre::ensure!(rejected.status() == TaskStatus::Cancelled);
    eyre::ensure!(rejected.approval_status() == ApprovalStatus::Rejected);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claimed_tasks_reject_update_and_delete(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let volunteer = relief.user(Role::Volunteer)?;
    let task = relief.open_task(&organizer, 3).await?;
    relief.claims.claim(task.id(), &volunteer, None).await?;

    let patch = TaskPatch {
        title: Some("Clear the old library".to_owned()),
        ..TaskPatch::default()
    };
    let update = relief
        .tasks
        .update(task.id(), patch, &organizer)
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("update with an active claim should fail"))?;
    let delete = relief
        .tasks
        .delete(task.id(), &organizer)
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("delete with an active claim should fail"))?;

    eyre::ensure!(update.kind() == FailureKind::InvalidState);
    eyre::ensure!(delete.kind() == FailureKind::InvalidState);

    let unchanged = relief
        .tasks
        .find(task.id(), &organizer)
        .await?
        .ok_or_else(|| eyre::eyre!("task should still exist"))?;
    eyre::ensure!(unchanged.details().title.as_str() == "Clear the community centre");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unclaimed_tasks_can_be_edited_and_deleted(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::SupplyManager)?;
    let task = relief.open_task(&organizer, 3).await?;

    let patch = TaskPatch {
        required_volunteers: Some(5),
        priority: Some(4),
        ..TaskPatch::default()
    };
    let edited = relief.tasks.update(task.id(), patch, &organizer).await?;
    eyre::ensure!(edited.capacity().value() == 5);
    eyre::ensure!(edited.details().priority.value() == 4);

    relief.tasks.delete(task.id(), &organizer).await?;
    eyre::ensure!(relief.tasks.find(task.id(), &organizer).await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn statistics_count_tasks_and_active_volunteers(relief: Relief) -> eyre::Result<()> {
    let organizer = relief.user(Role::OfficialOrganization)?;
    let community_group = relief.user(Role::UnofficialOrganization)?;
    let first = relief.user(Role::Volunteer)?;
    let second = relief.user(Role::Volunteer)?;

    let open = relief.open_task(&organizer, 4).await?;
    relief.open_task(&community_group, 1).await?;
    relief
        .tasks
        .create(
            CreateTaskRequest::new("Rescue", "Boat needed", TaskType::Rescue, "Low Road"),
            &organizer,
        )
        .await?;
    relief.claims.claim(open.id(), &first, None).await?;
    relief.claims.claim(open.id(), &second, None).await?;

    let stats = relief.tasks.statistics().await?;
    eyre::ensure!(stats.total == 3);
    eyre::ensure!(stats.pending_approval == 1);
    eyre::ensure!(stats.count_with_status(TaskStatus::Available) == 2);
    eyre::ensure!(stats.active_volunteers == 2);
    eyre::ensure!(stats.by_type.get("cleanup") == Some(&2));
    Ok(())
}
