//! Static role-to-capability table.

use crate::access::{
    domain::{Capability, CapabilitySet, Role},
    ports::AccessPolicy,
};

const OFFICIAL_ORGANIZATION: CapabilitySet = CapabilitySet::of(&[
    Capability::CreateTask,
    Capability::PublishTaskDirectly,
    Capability::ClaimTask,
    Capability::AssignNeed,
    Capability::ManageAnyNeed,
]);

const UNOFFICIAL_ORGANIZATION: CapabilitySet =
    CapabilitySet::of(&[Capability::CreateTask, Capability::ClaimTask]);

const SUPPLY_MANAGER: CapabilitySet = CapabilitySet::of(&[
    Capability::CreateTask,
    Capability::PublishTaskDirectly,
    Capability::ClaimTask,
    Capability::ManageAnyNeed,
]);

const VOLUNTEER: CapabilitySet = CapabilitySet::of(&[Capability::ClaimTask]);

const VICTIM: CapabilitySet = CapabilitySet::of(&[Capability::CreateNeed]);

/// The standard relief-operation policy.
///
/// Administrators hold every capability. Unofficial organizations may create
/// tasks but not publish them directly, so their tasks wait for approval.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleCapabilityTable;

impl RoleCapabilityTable {
    /// Creates the standard table.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the capability set for a role without dynamic dispatch.
    #[must_use]
    pub const fn lookup(role: Role) -> CapabilitySet {
        match role {
            Role::Administrator => CapabilitySet::all(),
            Role::OfficialOrganization => OFFICIAL_ORGANIZATION,
            Role::UnofficialOrganization => UNOFFICIAL_ORGANIZATION,
            Role::SupplyManager => SUPPLY_MANAGER,
            Role::Volunteer => VOLUNTEER,
            Role::Victim => VICTIM,
        }
    }
}

impl AccessPolicy for RoleCapabilityTable {
    fn capabilities(&self, role: Role) -> CapabilitySet {
        Self::lookup(role)
    }
}
