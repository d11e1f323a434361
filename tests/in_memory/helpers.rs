//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use reliefhub::{
    access::{
        adapters::{RoleCapabilityTable, memory::InMemoryUserDirectory},
        domain::{Actor, Role},
        ports::AccessPolicy,
    },
    config::ReliefConfig,
    events::adapters::RecordingEventPublisher,
    need::{adapters::memory::InMemoryNeedRepository, services::NeedLifecycleService},
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Task, TaskType},
        ports::TaskReferences,
        services::{ClaimAdmissionService, CreateTaskRequest, TaskLifecycleService},
    },
};
use rstest::fixture;

/// Task lifecycle service over the in-memory store.
pub type Tasks = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;
/// Claim admission service over the in-memory store.
pub type Claims = ClaimAdmissionService<InMemoryTaskRepository, DefaultClock>;
/// Need service over the in-memory store.
pub type Needs = NeedLifecycleService<InMemoryNeedRepository, DefaultClock>;

/// Every service wired to one set of in-memory adapters.
pub struct Relief {
    pub directory: InMemoryUserDirectory,
    pub events: RecordingEventPublisher,
    pub tasks: Tasks,
    pub claims: Claims,
    pub needs: Needs,
}

impl Relief {
    /// Wires services with the given configuration.
    #[must_use]
    pub fn with_config(config: &ReliefConfig) -> Self {
        let store = Arc::new(InMemoryTaskRepository::new());
        let directory = InMemoryUserDirectory::new();
        let events = RecordingEventPublisher::new();
        let policy: Arc<dyn AccessPolicy> = Arc::new(RoleCapabilityTable::new());
        let clock = Arc::new(DefaultClock);
        let need_store = Arc::new(InMemoryNeedRepository::new());

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
            config.admission.clone(),
        );
        let needs = NeedLifecycleService::new(
            need_store,
            Arc::new(directory.clone()),
            store,
            policy,
            Arc::new(events.clone()),
            clock,
        );
        Self {
            directory,
            events,
            tasks,
            claims,
            needs,
        }
    }

    /// Registers a user with the given role.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory rejects the registration.
    pub fn user(&self, role: Role) -> eyre::Result<Actor> {
        Ok(self.directory.register(role)?)
    }

    /// Publishes a cleanup task with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn open_task(&self, organizer: &Actor, capacity: u32) -> eyre::Result<Task> {
        let request = CreateTaskRequest::new(
            "Clear the community centre",
            "Flood debris in the main hall",
            TaskType::Cleanup,
            "1 Market Square",
        )
        .with_required_volunteers(capacity);
        Ok(self.tasks.create(request, organizer).await?)
    }
}

/// Provides services wired with test configuration.
#[fixture]
pub fn relief() -> Relief {
    Relief::with_config(&ReliefConfig::for_testing())
}
