//! Constraints the migration enforces independently of the services.

use super::helpers::{BoxError, TemporaryDatabase};
use diesel::connection::SimpleConnection;
use uuid::Uuid;

fn seed_task(user_id: Uuid, task_id: Uuid) -> String {
    format!(
        "INSERT INTO users (id, role) VALUES ('{user_id}', 'official_org');
         INSERT INTO tasks (id, creator_id, title, description, task_type, address,
                            required_volunteers, priority_level, status, approval_status)
         VALUES ('{task_id}', '{user_id}', 'Sweep', 'Mud', 'cleanup', 'Quay', 2, 1,
                 'available', 'approved');"
    )
}

fn claim_sql(task_id: Uuid, user_id: Uuid, status: &str) -> String {
    format!(
        "INSERT INTO task_claims (id, task_id, user_id, status)
         VALUES ('{}', '{task_id}', '{user_id}', '{status}');",
        Uuid::new_v4()
    )
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL"]
async fn one_active_claim_per_user_and_task() -> Result<(), BoxError> {
    let database = TemporaryDatabase::create().await?;
    let mut connection = database.connect()?;
    let user_id = Uuid::new_v4();
    let task_id = Uuid::new_v4();
    connection.batch_execute(&seed_task(user_id, task_id))?;

    connection.batch_execute(&claim_sql(task_id, user_id, "cancelled"))?;
    connection.batch_execute(&claim_sql(task_id, user_id, "claimed"))?;
    assert!(
        connection
            .batch_execute(&claim_sql(task_id, user_id, "started"))
            .is_err(),
        "a second active claim should violate the partial unique index"
    );
    connection.batch_execute(&claim_sql(task_id, user_id, "completed"))?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL"]
async fn ranges_are_checked() -> Result<(), BoxError> {
    let database = TemporaryDatabase::create().await?;
    let mut connection = database.connect()?;
    let user_id = Uuid::new_v4();
    connection.batch_execute(&format!(
        "INSERT INTO users (id, role) VALUES ('{user_id}', 'victim');"
    ))?;

    let need_sql = |urgency: u8| {
        format!(
            "INSERT INTO needs (id, reporter_id, title, description, need_type, address,
                                urgency_level, status)
             VALUES ('{}', '{user_id}', 'Water', 'None left', 'food', 'Quay', {urgency}, 'open');",
            Uuid::new_v4()
        )
    };
    connection.batch_execute(&need_sql(5))?;
    assert!(connection.batch_execute(&need_sql(6)).is_err());
    assert!(connection.batch_execute(&need_sql(0)).is_err());
    Ok(())
}
