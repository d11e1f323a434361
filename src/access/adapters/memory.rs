//! In-memory user directory for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::access::{
    domain::{Actor, Role, UserId},
    ports::{UserDirectory, UserDirectoryError, UserDirectoryResult},
};

/// Thread-safe in-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, Role>>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new user with the given role and returns it as an actor.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Persistence`] if the directory lock is
    /// poisoned.
    pub fn register(&self, role: Role) -> UserDirectoryResult<Actor> {
        let actor = Actor::new(UserId::new(), role);
        self.insert(actor)?;
        Ok(actor)
    }

    /// Inserts or replaces a user entry.
    ///
    /// # Errors
    ///
    /// Returns [`UserDirectoryError::Persistence`] if the directory lock is
    /// poisoned.
    pub fn insert(&self, actor: Actor) -> UserDirectoryResult<()> {
        let mut users = self.users.write().map_err(|err| {
            UserDirectoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        users.insert(actor.id(), actor.role());
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn role_of(&self, user_id: UserId) -> UserDirectoryResult<Option<Role>> {
        let users = self.users.read().map_err(|err| {
            UserDirectoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(users.get(&user_id).copied())
    }
}
