//! Port contracts for identity and authorization.

pub mod directory;
pub mod policy;

pub use directory::{UserDirectory, UserDirectoryError, UserDirectoryResult};
pub use policy::AccessPolicy;
