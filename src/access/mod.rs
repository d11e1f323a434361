//! Actor identity, roles, and capability checks.
//!
//! Every service call carries an [`domain::Actor`] supplied by the embedding
//! application's identity provider. Capability checks are evaluated once per
//! operation through the [`ports::AccessPolicy`] port rather than through
//! per-endpoint role lists.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
