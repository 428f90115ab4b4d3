//! Deterministic, pure logic shared by the launcher.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod preflight;
pub mod relay;
pub mod types;
