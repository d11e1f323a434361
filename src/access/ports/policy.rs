//! Authorization policy port.

use crate::access::domain::{AccessDenied, Actor, Capability, CapabilitySet, Role};

/// Resolves the capabilities granted to a role.
///
/// Services hold one policy and call [`AccessPolicy::authorize`] once per
/// operation.
#[cfg_attr(test, mockall::automock)]
pub trait AccessPolicy: Send + Sync {
    /// Returns every capability granted to the role.
    fn capabilities(&self, role: Role) -> CapabilitySet;

    /// Returns `true` when the actor's role grants the capability.
    fn allows(&self, actor: &Actor, capability: Capability) -> bool {
        self.capabilities(actor.role()).contains(capability)
    }

    /// Checks that the actor's role grants the capability.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] when the capability is missing.
    fn authorize(&self, actor: &Actor, capability: Capability) -> Result<(), AccessDenied> {
        if self.allows(actor, capability) {
            return Ok(());
        }
        Err(AccessDenied {
            user_id: actor.id(),
            role: actor.role(),
            capability,
        })
    }
}
