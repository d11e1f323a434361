//! Adapter implementations for task and claim ports.

pub mod memory;
pub mod postgres;
