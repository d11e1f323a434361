//! Capabilities granted to roles and the compact set that holds them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single permission checked by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create relief tasks.
    CreateTask,
    /// Publish new tasks without an approval step.
    PublishTaskDirectly,
    /// Approve or reject pending tasks.
    ApproveTask,
    /// Edit or delete tasks created by someone else.
    ManageAnyTask,
    /// View every task regardless of approval state.
    ViewAllTasks,
    /// Claim slots on tasks.
    ClaimTask,
    /// Report needs.
    CreateNeed,
    /// Assign, unassign, and reassign needs.
    AssignNeed,
    /// Progress, resolve, and close any need.
    ManageAnyNeed,
    /// Edit or delete needs reported by someone else.
    DeleteAnyNeed,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::CreateTask,
        Self::PublishTaskDirectly,
        Self::ApproveTask,
        Self::ManageAnyTask,
        Self::ViewAllTasks,
        Self::ClaimTask,
        Self::CreateNeed,
        Self::AssignNeed,
        Self::ManageAnyNeed,
        Self::DeleteAnyNeed,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::PublishTaskDirectly => "publish_task_directly",
            Self::ApproveTask => "approve_task",
            Self::ManageAnyTask => "manage_any_task",
            Self::ViewAllTasks => "view_all_tasks",
            Self::ClaimTask => "claim_task",
            Self::CreateNeed => "create_need",
            Self::AssignNeed => "assign_need",
            Self::ManageAnyNeed => "manage_any_need",
            Self::DeleteAnyNeed => "delete_any_need",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of capabilities, stored as a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Builds a set from a slice of capabilities.
    #[must_use]
    pub const fn of(capabilities: &[Capability]) -> Self {
        let mut bits = 0;
        let mut remaining = capabilities;
        while let [first, rest @ ..] = remaining {
            bits |= first.bit();
            remaining = rest;
        }
        Self(bits)
    }

    /// Returns a set containing every capability.
    #[must_use]
    pub const fn all() -> Self {
        Self::of(&Capability::ALL)
    }

    /// Returns `true` when the set grants the capability.
    #[must_use]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Returns the set with the capability added.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Returns `true` when nothing is granted.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over granted capabilities in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}
