//! Pre-flight launcher for the hamster monitor server.
//!
//! The launcher checks that an interpreter runs, activates the configured
//! runtime environment, confirms the entry point (and, softly, the model file)
//! exist, then hands off to the entry point once and relays its exit status.
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (check ordering, result types,
//!   exit-code relay). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, probes, environment
//!   managers, process launch, console). Behind traits so tests can script them.
//!
//! Orchestration modules ([`check`], [`launch`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod check;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod launch;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
