//! `PostgreSQL` adapter for the user directory.

mod repository;
pub(crate) mod schema;

pub use repository::PostgresUserDirectory;
