//! In-memory adapters for tasks and claims.

mod ledger;
mod locks;
mod task;

pub use task::InMemoryTaskRepository;
