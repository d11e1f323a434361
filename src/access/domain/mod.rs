//! Domain model for actors and their capabilities.

mod actor;
mod capability;
mod error;
mod ids;
mod role;

pub use actor::Actor;
pub use capability::{Capability, CapabilitySet};
pub use error::{AccessDenied, ParseRoleError};
pub use ids::UserId;
pub use role::Role;
