//! Identifier and validated scalar types for the need domain.

use super::NeedDomainError;
use crate::task::domain::uuid_id;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

uuid_id! {
    /// Unique identifier for a reported need.
    NeedId
}

uuid_id! {
    /// Unique identifier for an assignment record.
    AssignmentId
}

/// How urgent a need is, from 1 (lowest) to 5 (most urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UrgencyLevel(u8);

impl UrgencyLevel {
    /// Lowest urgency.
    pub const LOWEST: Self = Self(1);

    /// Most urgent.
    pub const HIGHEST: Self = Self(5);

    /// Creates a validated urgency level.
    ///
    /// # Errors
    ///
    /// Returns [`NeedDomainError::InvalidUrgencyLevel`] when the value is
    /// outside `1..=5`.
    pub const fn new(value: u8) -> Result<Self, NeedDomainError> {
        if value < Self::LOWEST.0 || value > Self::HIGHEST.0 {
            return Err(NeedDomainError::InvalidUrgencyLevel(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl TryFrom<u8> for UrgencyLevel {
    type Error = NeedDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UrgencyLevel> for u8 {
    fn from(value: UrgencyLevel) -> Self {
        value.0
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
