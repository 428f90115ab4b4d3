//! I/O adapters for launcher commands.

pub mod config;
pub mod console;
pub mod entry_point;
pub mod environment;
pub mod init;
pub mod interpreter;
pub mod process;
