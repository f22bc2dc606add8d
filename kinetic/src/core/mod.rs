//! Deterministic, pure logic shared by the resolver and the orchestrator.
//!
//! Core modules must be free of I/O and shared mutable state. They operate on
//! in-memory values and return deterministic outputs suitable for tests.

pub mod cost;
pub mod phase;
pub mod selector;
pub mod types;
