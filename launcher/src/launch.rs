//! Orchestration for `launcher launch`.
//!
//! A launch runs the pre-flight checks, hands off to the entry point exactly
//! once, and relays the child's status. Every failure path prints its
//! diagnostics and blocks on [`Console::acknowledge`] before returning.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::check::run_preflight;
use crate::core::preflight::PreflightReport;
use crate::core::relay::relay_exit_code;
use crate::core::types::ChildExit;
use crate::exit_codes;
use crate::io::config::LauncherConfig;
use crate::io::console::Console;
use crate::io::entry_point::{EntryPointSpawner, LaunchRequest};
use crate::io::environment::{ActivatedEnvironment, EnvironmentActivator};
use crate::io::interpreter::InterpreterProbe;

/// Outcome of `launcher launch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub report: PreflightReport,
    /// `None` when no child ran (pre-flight failure or spawn error).
    pub child: Option<ChildExit>,
    /// Code the launcher process should exit with.
    pub exit_code: i32,
}

/// Run the full launch flow in `root`.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn run_launch<P, A, S, C>(
    root: &Path,
    config: &LauncherConfig,
    probe: &P,
    activator: &A,
    spawner: &S,
    console: &C,
) -> Result<LaunchOutcome>
where
    P: InterpreterProbe,
    A: EnvironmentActivator,
    S: EntryPointSpawner,
    C: Console,
{
    let preflight = run_preflight(root, config, probe, activator);
    let report = preflight.report;

    for warning in report.warnings() {
        console.warning(&warning.to_string());
    }

    if let Some(failure) = report.fatal() {
        console.error(&failure.to_string());
        if let Some(guidance) = failure.guidance() {
            console.notice(&guidance);
        }
        console.acknowledge()?;
        return Ok(LaunchOutcome {
            report,
            child: None,
            exit_code: exit_codes::INVALID,
        });
    }

    let environment = preflight.environment.unwrap_or_else(|| {
        ActivatedEnvironment::passthrough(&config.interpreter.program)
    });
    let request = LaunchRequest {
        workdir: root.to_path_buf(),
        interpreter: environment.interpreter,
        entry_point: config.entry_point.path.clone(),
        args: config.entry_point.args.clone(),
        vars: environment.vars,
    };

    console.notice(&format!(
        "Starting {}. The server should be available at {}",
        request.entry_point.display(),
        config.server.url()
    ));
    console.notice("Press Ctrl+C to stop.");
    info!(url = %config.server.url(), "launching entry point");

    let child = match spawner.spawn(&request) {
        Ok(child) => child,
        Err(err) => {
            let detail = format!("{err:#}");
            warn!(err = %detail, "entry point did not start");
            console.error(&format!(
                "failed to start {}: {detail}",
                request.entry_point.display()
            ));
            console.acknowledge()?;
            return Ok(LaunchOutcome {
                report,
                child: None,
                exit_code: exit_codes::INVALID,
            });
        }
    };

    match child {
        ChildExit::Completed => debug!("entry point exited cleanly"),
        ChildExit::Crashed { code } => {
            warn!(code, "entry point crashed");
            console.error(&format!(
                "{} crashed with exit code {code}",
                request.entry_point.display()
            ));
            console.acknowledge()?;
        }
        ChildExit::Terminated => {
            warn!("entry point terminated without exit code");
            console.error(&format!(
                "{} was terminated without an exit code",
                request.entry_point.display()
            ));
            console.acknowledge()?;
        }
    }

    Ok(LaunchOutcome {
        report,
        child: Some(child),
        exit_code: relay_exit_code(child),
    })
}
