//! `PostgreSQL` adapter for need persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresNeedRepository;
