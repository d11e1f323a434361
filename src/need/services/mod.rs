//! Service layer for need reporting and assignment.

mod lifecycle;

pub use lifecycle::{
    CreateNeedRequest, NeedAssignmentRequest, NeedLifecycleError, NeedLifecycleResult,
    NeedLifecycleService,
};
