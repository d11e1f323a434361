//! Error types for access checks and role parsing.

use super::{Capability, Role, UserId};
use thiserror::Error;

/// Returned when an actor's role lacks a required capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("user {user_id} with role {role} lacks capability {capability}")]
pub struct AccessDenied {
    /// Acting user.
    pub user_id: UserId,
    /// Role the user acted under.
    pub role: Role,
    /// Capability that was required.
    pub capability: Capability,
}

/// Error returned while parsing roles from persistence or identity claims.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
