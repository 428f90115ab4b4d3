//! Mapping from launch outcomes to the launcher's own exit code.

use crate::core::types::ChildExit;
use crate::exit_codes;

/// Exit code the launcher terminates with after the child returned.
///
/// The child's code is relayed verbatim; a child terminated without a code
/// maps to [`exit_codes::INVALID`].
pub fn relay_exit_code(exit: ChildExit) -> i32 {
    match exit {
        ChildExit::Completed => exit_codes::OK,
        ChildExit::Crashed { code } => code,
        ChildExit::Terminated => exit_codes::INVALID,
    }
}
