//! I/O helpers for the `kinetic` binary.

pub mod config;
