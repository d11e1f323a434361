//! Directory port used to validate user references.

use crate::access::domain::{Role, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type UserDirectoryResult<T> = Result<T, UserDirectoryError>;

/// Read-only view of the users known to the identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the user's role, or `None` when the user does not exist.
    async fn role_of(&self, user_id: UserId) -> UserDirectoryResult<Option<Role>>;

    /// Returns `true` when the user exists.
    async fn exists(&self, user_id: UserId) -> UserDirectoryResult<bool> {
        Ok(self.role_of(user_id).await?.is_some())
    }
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum UserDirectoryError {
    /// Persistence-layer failure.
    #[error("directory lookup failed: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl UserDirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
