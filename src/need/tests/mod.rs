//! Unit tests for the need context.
