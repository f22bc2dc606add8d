//! Stable exit codes for `kinetic` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid arguments, config, or an internal sequencing error.
pub const INVALID: i32 = 1;
/// `kinetic resolve` found no candidate within budget.
pub const BLOCKED: i32 = 2;
/// The selected handler failed.
pub const HANDLER_FAILED: i32 = 3;
