//! Error types for need validation and transitions.

use super::{NeedAction, NeedId, NeedStatus};
use crate::error::FailureKind;
use thiserror::Error;

/// Errors returned while constructing or transitioning needs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NeedDomainError {
    /// The title is empty after trimming.
    #[error("need title must not be empty")]
    EmptyTitle,

    /// The title exceeds the storage limit.
    #[error("need title exceeds 200 characters ({0})")]
    TitleTooLong(usize),

    /// The description is empty after trimming.
    #[error("need description must not be empty")]
    EmptyDescription,

    /// The address is empty after trimming.
    #[error("need address must not be empty")]
    EmptyAddress,

    /// The urgency level is outside the accepted range.
    #[error("urgency level {0} outside 1..=5")]
    InvalidUrgencyLevel(u8),

    /// The action is not legal in the need's current status.
    #[error("cannot {action} need {need_id} in status {status}")]
    InvalidTransition {
        /// Need identifier.
        need_id: NeedId,
        /// Attempted action.
        action: NeedAction,
        /// Current status.
        status: NeedStatus,
    },
}

impl NeedDomainError {
    /// Returns the failure category callers observe.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::InvalidTransition { .. } => FailureKind::InvalidState,
            Self::EmptyTitle
            | Self::TitleTooLong(_)
            | Self::EmptyDescription
            | Self::EmptyAddress
            | Self::InvalidUrgencyLevel(_) => FailureKind::Validation,
        }
    }
}

/// Error returned while parsing need enumerations from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseNeedValueError {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseNeedValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
