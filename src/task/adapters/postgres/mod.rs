//! `PostgreSQL` adapters for task and claim persistence.

mod ledger;
mod mapping;
mod models;
mod repository;
mod schema;

pub use repository::PostgresTaskRepository;
