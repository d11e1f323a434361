//! Adapter implementations for need ports.

pub mod memory;
pub mod postgres;
