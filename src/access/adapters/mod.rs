//! Adapter implementations for access ports.

pub mod memory;
pub mod postgres;
mod role_table;

pub use role_table::RoleCapabilityTable;
