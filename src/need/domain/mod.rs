//! Domain model for needs and their assignment trail.

mod assignment;
mod error;
mod ids;
mod need;

pub use assignment::{Assignment, AssignmentStatus, PersistedAssignmentData};
pub use error::{NeedDomainError, ParseNeedValueError};
pub use ids::{AssignmentId, NeedId, UrgencyLevel};
pub use need::{
    Need, NeedAction, NeedContent, NeedRevision, NeedStatus, NeedType, PersistedNeedData,
    Resolution,
};
