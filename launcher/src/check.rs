//! Pre-flight checks against the host: `launcher check` and the first half of `launcher launch`.

use std::path::Path;

use tracing::{debug, warn};

use crate::core::preflight::{PreflightReport, evaluate};
use crate::core::types::{CheckId, CheckResult, Failure, Warning};
use crate::io::config::LauncherConfig;
use crate::io::environment::{ActivatedEnvironment, EnvironmentActivator};
use crate::io::interpreter::InterpreterProbe;

/// Report plus the environment resolved along the way.
#[derive(Debug, Clone)]
pub struct PreflightOutcome {
    pub report: PreflightReport,
    /// Present whenever the environment check passed.
    pub environment: Option<ActivatedEnvironment>,
}

/// Run every pre-flight check in order, stopping at the first fatal one.
pub fn run_preflight<P: InterpreterProbe, A: EnvironmentActivator>(
    root: &Path,
    config: &LauncherConfig,
    probe: &P,
    activator: &A,
) -> PreflightOutcome {
    let mut environment = None;
    let report = evaluate(&CheckId::ORDER, |id| {
        let result = match id {
            CheckId::Interpreter => check_interpreter(config, probe),
            CheckId::Environment => match activator.activate(root, config) {
                Ok(activated) => {
                    let detail = activated.describe();
                    environment = Some(activated);
                    CheckResult::Ok(detail)
                }
                Err(err) => CheckResult::Fatal(Failure::EnvironmentActivationFailed {
                    name: config.environment.name.clone(),
                    reason: format!("{err:#}"),
                }),
            },
            CheckId::EntryPoint => check_entry_point(root, &config.entry_point.path),
            CheckId::ModelFile => check_model_file(root, &config.model.path),
        };
        match &result {
            CheckResult::Ok(detail) => debug!(check = id.label(), detail = %detail, "check passed"),
            CheckResult::Warning(warning) => warn!(check = id.label(), %warning, "check warned"),
            CheckResult::Fatal(failure) => warn!(check = id.label(), %failure, "check failed"),
        }
        result
    });
    PreflightOutcome {
        report,
        environment,
    }
}

fn check_interpreter<P: InterpreterProbe>(config: &LauncherConfig, probe: &P) -> CheckResult {
    match probe.probe(&config.interpreter, config.probe_timeout()) {
        Ok(banner) => CheckResult::Ok(banner),
        Err(err) => CheckResult::Fatal(Failure::InterpreterMissing {
            program: config.interpreter.program.clone(),
            reason: format!("{err:#}"),
        }),
    }
}

fn check_entry_point(root: &Path, path: &Path) -> CheckResult {
    if root.join(path).is_file() {
        CheckResult::Ok(path.display().to_string())
    } else {
        CheckResult::Fatal(Failure::EntryPointMissing {
            path: path.display().to_string(),
        })
    }
}

fn check_model_file(root: &Path, path: &Path) -> CheckResult {
    if root.join(path).is_file() {
        CheckResult::Ok(path.display().to_string())
    } else {
        CheckResult::Warning(Warning::ModelFileMissing {
            path: path.display().to_string(),
        })
    }
}

/// Human-readable report, one line per evaluated check.
pub fn render_report(report: &PreflightReport) -> String {
    let mut out = String::new();
    for record in &report.checks {
        let (tag, detail) = match &record.result {
            CheckResult::Ok(detail) => ("ok", detail.clone()),
            CheckResult::Warning(warning) => ("warning", warning.to_string()),
            CheckResult::Fatal(failure) => ("fatal", failure.to_string()),
        };
        out.push_str(&format!("{tag:<8} {:<12} {detail}\n", record.id.label()));
    }
    out
}
