//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use uuid_id;

uuid_id! {
    /// Unique identifier for a relief task.
    TaskId
}

uuid_id! {
    /// Unique identifier for a volunteer's claim on a task.
    ClaimId
}

/// Number of volunteers a task needs; the task's admission capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RequiredVolunteers(u32);

impl RequiredVolunteers {
    /// Largest capacity a single task may request.
    pub const MAX: u32 = 100;

    /// Creates a validated capacity.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRequiredVolunteers`] when the value
    /// is zero or exceeds [`Self::MAX`].
    pub const fn new(value: u32) -> Result<Self, TaskDomainError> {
        if value == 0 || value > Self::MAX {
            return Err(TaskDomainError::InvalidRequiredVolunteers(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying count.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns `true` when `active` claims fill every slot.
    #[must_use]
    pub const fn is_filled_by(self, active: u32) -> bool {
        active >= self.0
    }
}

impl TryFrom<u32> for RequiredVolunteers {
    type Error = TaskDomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequiredVolunteers> for u32 {
    fn from(value: RequiredVolunteers) -> Self {
        value.0
    }
}

impl fmt::Display for RequiredVolunteers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task priority from 1 (lowest) to 5 (highest).
///
/// Priority orders listings only; it never influences claim admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PriorityLevel(u8);

impl PriorityLevel {
    /// Lowest priority.
    pub const LOWEST: Self = Self(1);

    /// Creates a validated priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPriorityLevel`] when the value is
    /// outside `1..=5`.
    pub const fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value < 1 || value > 5 {
            return Err(TaskDomainError::InvalidPriorityLevel(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for PriorityLevel {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl TryFrom<u8> for PriorityLevel {
    type Error = TaskDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PriorityLevel> for u8 {
    fn from(value: PriorityLevel) -> Self {
        value.0
    }
}
