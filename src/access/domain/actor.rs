//! The authenticated caller of a service operation.

use super::{Role, UserId};
use serde::{Deserialize, Serialize};

/// Identity and role supplied with every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Returns the acting user's identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the role the user acts under.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns `true` when the actor is the given user.
    #[must_use]
    pub fn is(&self, user_id: UserId) -> bool {
        self.id == user_id
    }
}
