//! Interpreter availability probe.

use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument};

use crate::io::config::InterpreterConfig;
use crate::io::process::{PROBE_OUTPUT_LIMIT_BYTES, run_command_with_timeout};

/// Abstraction over interpreter discovery.
pub trait InterpreterProbe {
    /// Return the interpreter's version banner, or an error if it cannot run.
    fn probe(&self, interpreter: &InterpreterConfig, timeout: Duration) -> Result<String>;
}

/// Probe that runs `<program> <version_args>` on the host.
pub struct SystemInterpreterProbe;

impl InterpreterProbe for SystemInterpreterProbe {
    #[instrument(skip_all, fields(program = %interpreter.program))]
    fn probe(&self, interpreter: &InterpreterConfig, timeout: Duration) -> Result<String> {
        let mut cmd = Command::new(&interpreter.program);
        cmd.args(&interpreter.version_args);
        let output = run_command_with_timeout(cmd, timeout, PROBE_OUTPUT_LIMIT_BYTES)?;
        if !output.success() {
            return Err(anyhow!(output.failure_reason()));
        }
        let banner = version_banner(&output.stdout_text(), &output.stderr_text());
        debug!(banner = %banner, "interpreter found");
        Ok(banner)
    }
}

/// Pick the version line from a probe's output.
///
/// Python 2 prints its version on stderr, Python 3 on stdout.
fn version_banner(stdout: &str, stderr: &str) -> String {
    let source = if stdout.is_empty() { stderr } else { stdout };
    source.lines().next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_prefers_stdout() {
        assert_eq!(version_banner("Python 3.11.4\n", ""), "Python 3.11.4");
        assert_eq!(version_banner("", "Python 2.7.18"), "Python 2.7.18");
        assert_eq!(version_banner("", ""), "");
    }

    #[test]
    fn missing_program_is_an_error() {
        let interpreter = InterpreterConfig {
            program: "no-such-interpreter-5b1c".to_string(),
            version_args: vec!["--version".to_string()],
        };
        let err = SystemInterpreterProbe
            .probe(&interpreter, Duration::from_secs(5))
            .expect_err("probe should fail");
        assert!(format!("{err:#}").contains("no-such-interpreter-5b1c"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_probe_reports_exit_code() {
        let interpreter = InterpreterConfig {
            program: "sh".to_string(),
            version_args: vec!["-c".to_string(), "exit 9".to_string()],
        };
        let err = SystemInterpreterProbe
            .probe(&interpreter, Duration::from_secs(5))
            .expect_err("probe should fail");
        assert!(err.to_string().contains("exit code 9"));
    }

    #[cfg(unix)]
    #[test]
    fn successful_probe_returns_banner() {
        let interpreter = InterpreterConfig {
            program: "sh".to_string(),
            version_args: vec!["-c".to_string(), "echo 'Python 3.12.1'".to_string()],
        };
        let banner = SystemInterpreterProbe
            .probe(&interpreter, Duration::from_secs(5))
            .expect("probe");
        assert_eq!(banner, "Python 3.12.1");
    }
}
