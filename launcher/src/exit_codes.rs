//! Stable exit codes for launcher CLI commands.
//!
//! After a successful handoff the launcher exits with the child's own code
//! instead (see [`crate::core::relay`]).

/// Command succeeded, or the launched child exited cleanly.
pub const OK: i32 = 0;
/// A pre-flight check failed, or the launcher itself hit an error.
pub const INVALID: i32 = 1;
