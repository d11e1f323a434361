//! Shared world state for relief operation BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use reliefhub::{
    access::{
        adapters::{RoleCapabilityTable, memory::InMemoryUserDirectory},
        domain::{Actor, Role},
        ports::AccessPolicy,
    },
    config::ReliefConfig,
    error::FailureKind,
    events::{EventPublisher, adapters::TracingEventPublisher},
    need::{
        adapters::memory::InMemoryNeedRepository, domain::Need, services::NeedLifecycleService,
    },
    task::{
        adapters::memory::InMemoryTaskRepository,
        domain::{Claim, Task},
        ports::TaskReferences,
        services::{ClaimAdmissionService, TaskLifecycleService},
    },
};
use rstest::fixture;

/// Scenario world for relief behaviour tests.
pub struct ReliefWorld {
    pub directory: InMemoryUserDirectory,
    pub tasks: TaskLifecycleService<InMemoryTaskRepository, DefaultClock>,
    pub claims: ClaimAdmissionService<InMemoryTaskRepository, DefaultClock>,
    pub needs: NeedLifecycleService<InMemoryNeedRepository, DefaultClock>,
    pub organizer: Option<Actor>,
    pub volunteer: Option<Actor>,
    pub task: Option<Task>,
    pub need: Option<Need>,
    pub claim_results: Vec<Result<Claim, FailureKind>>,
    pub last_failure: Option<FailureKind>,
}

impl ReliefWorld {
    /// Creates a world backed by fresh in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let config = ReliefConfig::for_testing();
        let store = Arc::new(InMemoryTaskRepository::new());
        let directory = InMemoryUserDirectory::new();
        let policy: Arc<dyn AccessPolicy> = Arc::new(RoleCapabilityTable::new());
        let events: Arc<dyn EventPublisher> = Arc::new(TracingEventPublisher);
        let clock = Arc::new(DefaultClock);
        let need_store = Arc::new(InMemoryNeedRepository::new());

        Self {
            tasks: TaskLifecycleService::new(
                Arc::clone(&store),
                Arc::clone(&policy),
                Arc::clone(&events),
                Arc::clone(&clock),
            )
            .with_references(Arc::clone(&need_store) as Arc<dyn TaskReferences>),
            claims: ClaimAdmissionService::new(
                Arc::clone(&store),
                Arc::clone(&policy),
                Arc::clone(&events),
                Arc::clone(&clock),
                config.admission,
            ),
            needs: NeedLifecycleService::new(
                need_store,
                Arc::new(directory.clone()),
                store,
                policy,
                events,
                clock,
            ),
            directory,
            organizer: None,
            volunteer: None,
            task: None,
            need: None,
            claim_results: Vec::new(),
            last_failure: None,
        }
    }

    /// Registers a user with the given role.
    pub fn register(&self, role: Role) -> Result<Actor, eyre::Report> {
        Ok(self.directory.register(role)?)
    }

    /// Returns the scenario's task.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Returns the scenario's need.
    pub fn need(&self) -> Result<&Need, eyre::Report> {
        self.need
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing need in scenario world"))
    }

    /// Returns the task's creator.
    pub fn organizer(&self) -> Result<Actor, eyre::Report> {
        self.organizer
            .ok_or_else(|| eyre::eyre!("missing organizer in scenario world"))
    }

    /// Returns the scenario's volunteer.
    pub fn volunteer(&self) -> Result<Actor, eyre::Report> {
        self.volunteer
            .ok_or_else(|| eyre::eyre!("missing volunteer in scenario world"))
    }
}

impl Default for ReliefWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReliefWorld {
    ReliefWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
