//! User-facing console output.
//!
//! This is product output, separate from `tracing` diagnostics (see
//! [`crate::logging`]). Errors and warnings go to stderr, notices to stdout.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use tracing::debug;

/// Console used by the launch flow.
pub trait Console {
    fn notice(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    /// Block until the user acknowledges the last message.
    fn acknowledge(&self) -> Result<()>;
}

/// Console bound to the process's stdio.
pub struct TerminalConsole {
    pause: bool,
}

impl TerminalConsole {
    /// Pausing only happens when enabled and stdin is an interactive terminal.
    pub fn new(pause: bool) -> Self {
        Self {
            pause: pause && io::stdin().is_terminal(),
        }
    }
}

impl Console for TerminalConsole {
    fn notice(&self, message: &str) {
        println!("{message}");
    }

    fn warning(&self, message: &str) {
        eprintln!("warning: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn acknowledge(&self) -> Result<()> {
        if !self.pause {
            debug!("pause skipped");
            return Ok(());
        }
        let mut stdout = io::stdout();
        write!(stdout, "Press Enter to continue...").context("write pause prompt")?;
        stdout.flush().context("flush pause prompt")?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("read acknowledgment")?;
        Ok(())
    }
}
