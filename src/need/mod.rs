//! Reported needs and the assignment of each need to one responsible user.
//!
//! Needs follow the same hexagonal layout as tasks but have no capacity
//! problem: a need has at most one assignee at a time, and every assignment
//! change appends to an audit trail of [`domain::Assignment`] records.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
