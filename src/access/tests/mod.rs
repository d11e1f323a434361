//! Unit tests for the access context.
