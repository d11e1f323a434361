//! Roles assigned to users by the identity provider.

use super::ParseRoleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an actor within the relief operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System administrator.
    Administrator,
    /// Disaster victim reporting needs.
    Victim,
    /// Officially registered volunteer organization.
    OfficialOrganization,
    /// Volunteer organization whose tasks require review.
    UnofficialOrganization,
    /// Supply station manager.
    SupplyManager,
    /// Individual volunteer.
    Volunteer,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Administrator,
        Self::Victim,
        Self::OfficialOrganization,
        Self::UnofficialOrganization,
        Self::SupplyManager,
        Self::Volunteer,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "admin",
            Self::Victim => "victim",
            Self::OfficialOrganization => "official_org",
            Self::UnofficialOrganization => "unofficial_org",
            Self::SupplyManager => "supply_manager",
            Self::Volunteer => "volunteer",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| ParseRoleError(value.to_owned()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
