//! Shared test helpers for `PostgreSQL` integration tests.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use mockable::DefaultClock;
use reliefhub::{
    access::{
        adapters::{RoleCapabilityTable, postgres::PostgresUserDirectory},
        domain::{Actor, Role},
        ports::AccessPolicy,
    },
    config::ReliefConfig,
    events::adapters::RecordingEventPublisher,
    need::{adapters::postgres::PostgresNeedRepository, services::NeedLifecycleService},
    pg::{PgPool, build_pool},
    task::{
        adapters::postgres::PostgresTaskRepository,
        domain::{Task, TaskType},
        ports::TaskReferences,
        services::{ClaimAdmissionService, CreateTaskRequest, TaskLifecycleService},
    },
};
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming the server used for tests.
pub const DATABASE_URL_VAR: &str = "RELIEFHUB_TEST_DATABASE_URL";

/// Reason attached to every test that needs a live server.
pub const NEEDS_SERVER: &str =
    "requires a PostgreSQL server named by RELIEFHUB_TEST_DATABASE_URL";

/// SQL creating the full schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_relief_tables/up.sql");

/// A database created for one test and dropped afterwards.
pub struct TemporaryDatabase {
    admin_url: String,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Creates a migrated database on the configured server.
    ///
    /// # Errors
    ///
    /// Returns an error if [`DATABASE_URL_VAR`] is unset or if creation or
    /// migration fails.
    pub async fn create() -> Result<Self, BoxError> {
        let admin_url = std::env::var(DATABASE_URL_VAR)
            .map_err(|_| format!("{DATABASE_URL_VAR} must be set: {NEEDS_SERVER}"))?;
        let name = format!("reliefhub_test_{}", Uuid::new_v4().simple());
        let url = with_database(&admin_url, &name)?;
        let database = Self {
            admin_url,
            name,
            url,
        };
        let admin_url = database.admin_url.clone();
        let create_sql = format!("CREATE DATABASE {}", database.name);
        let url = database.url.clone();
        tokio::task::spawn_blocking(move || -> Result<(), BoxError> {
            PgConnection::establish(&admin_url)?.batch_execute(&create_sql)?;
            PgConnection::establish(&url)?.batch_execute(CREATE_SCHEMA_SQL)?;
            Ok(())
        })
        .await??;
        Ok(database)
    }

    /// Builds a pool for the temporary database.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot connect.
    pub fn pool(&self, max_size: u32) -> Result<PgPool, BoxError> {
        Ok(build_pool(&self.url, max_size)?)
    }

    /// Opens a direct connection to the temporary database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub fn connect(&self) -> Result<PgConnection, BoxError> {
        Ok(PgConnection::establish(&self.url)?)
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        let drop_sql = format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", self.name);
        if let Ok(mut connection) = PgConnection::establish(&self.admin_url) {
            let _ignored = connection.batch_execute(&drop_sql);
        }
    }
}

fn with_database(admin_url: &str, name: &str) -> Result<String, BoxError> {
    let (base, rest) = admin_url
        .rsplit_once('/')
        .ok_or("database URL has no path")?;
    Ok(match rest.split_once('?') {
        Some((_, query)) => format!("{base}/{name}?{query}"),
        None => format!("{base}/{name}"),
    })
}

/// Every service wired to one temporary database.
pub struct PgRelief {
    pub database: TemporaryDatabase,
    pub directory: PostgresUserDirectory,
    pub events: RecordingEventPublisher,
    pub tasks: TaskLifecycleService<PostgresTaskRepository, DefaultClock>,
    pub claims: ClaimAdmissionService<PostgresTaskRepository, DefaultClock>,
    pub needs: NeedLifecycleService<PostgresNeedRepository, DefaultClock>,
}

impl PgRelief {
    /// Wires services to a fresh database.
    ///
    /// # Errors
    ///
    /// Returns an error if no server is configured or setup fails.
    pub async fn create() -> Result<Self, BoxError> {
        let database = TemporaryDatabase::create().await?;
        let pool = database.pool(8)?;
        let store = Arc::new(PostgresTaskRepository::new(pool.clone()));
        let directory = PostgresUserDirectory::new(pool.clone());
        let events = RecordingEventPublisher::new();
        let policy: Arc<dyn AccessPolicy> = Arc::new(RoleCapabilityTable::new());
        let clock = Arc::new(DefaultClock);
        let need_store = Arc::new(PostgresNeedRepository::new(pool));

        let tasks = TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&policy),
            Arc::new(events.clone()),
            Arc::clone(&clock),
        )
        .with_references(Arc::clone(&need_store) as Arc<dyn TaskReferences>);
        let claims = ClaimAdmissionService::new(
            Arc::clone(&store),
            Arc::clone(&policy),
            Arc::new(events.clone()),
            Arc::clone(&clock),
            ReliefConfig::for_testing().admission,
        );
        let needs = NeedLifecycleService::new(
            need_store,
            Arc::new(directory.clone()),
            store,
            policy,
            Arc::new(events.clone()),
            clock,
        );
        Ok(Self {
            database,
            directory,
            events,
            tasks,
            claims,
            needs,
        })
    }

    /// Registers a user with the given role.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn user(&self, role: Role) -> Result<Actor, BoxError> {
        Ok(self.directory.register(role).await?)
    }

    /// Publishes a task with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn open_task(&self, organizer: &Actor, capacity: u32) -> Result<Task, BoxError> {
        let request = CreateTaskRequest::new(
            "Pump out the care home basement",
            "Two pumps on site",
            TaskType::Cleanup,
            "8 Orchard Close",
        )
        .with_required_volunteers(capacity)
        .with_required_skills(["pump operation".to_owned()]);
        Ok(self.tasks.create(request, organizer).await?)
    }
}
