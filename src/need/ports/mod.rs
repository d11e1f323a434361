//! Port contracts for need persistence.

pub mod repository;

pub use repository::{
    NeedQuery, NeedRepository, NeedRepositoryError, NeedRepositoryResult, NeedStatistics,
    NeedVisibility,
};
