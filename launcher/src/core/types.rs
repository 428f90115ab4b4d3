//! Shared deterministic types for the pre-flight checks.
//!
//! These types define stable contracts between the check evaluator, the
//! launch orchestration, and the console. They carry no I/O.

use std::fmt;

use serde::Serialize;

/// Named pre-flight checks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    Interpreter,
    Environment,
    EntryPoint,
    ModelFile,
}

impl CheckId {
    /// The fixed order in which checks are evaluated.
    pub const ORDER: [CheckId; 4] = [
        CheckId::Interpreter,
        CheckId::Environment,
        CheckId::EntryPoint,
        CheckId::ModelFile,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CheckId::Interpreter => "interpreter",
            CheckId::Environment => "environment",
            CheckId::EntryPoint => "entry point",
            CheckId::ModelFile => "model file",
        }
    }
}

/// Fatal pre-flight failures. Any of these aborts before the handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    InterpreterMissing { program: String, reason: String },
    EnvironmentActivationFailed { name: String, reason: String },
    EntryPointMissing { path: String },
}

impl Failure {
    /// Follow-up hint printed after the error line.
    pub fn guidance(&self) -> Option<String> {
        match self {
            Failure::InterpreterMissing { program, .. } => Some(format!(
                "Install Python and make sure `{program}` is on PATH, or set interpreter.program in launcher.toml."
            )),
            Failure::EnvironmentActivationFailed { name, .. } => Some(format!(
                "Create the environment first (e.g. `conda create -n {name} python`), or set environment.name in launcher.toml."
            )),
            Failure::EntryPointMissing { .. } => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::InterpreterMissing { program, reason } => {
                write!(f, "interpreter `{program}` is not available: {reason}")
            }
            Failure::EnvironmentActivationFailed { name, reason } => {
                write!(f, "failed to activate environment '{name}': {reason}")
            }
            Failure::EntryPointMissing { path } => {
                write!(f, "{path} not found in the working directory")
            }
        }
    }
}

/// Non-fatal pre-flight findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    ModelFileMissing { path: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::ModelFileMissing { path } => {
                write!(f, "{path} not found; activity detection will not work")
            }
        }
    }
}

/// Tagged result of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum CheckResult {
    Ok(String),
    Fatal(Failure),
    Warning(Warning),
}

impl CheckResult {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CheckResult::Fatal(_))
    }
}

/// One evaluated check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    pub id: CheckId,
    #[serde(flatten)]
    pub result: CheckResult,
}

/// How the launched entry point ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChildExit {
    /// Exited with status zero.
    Completed,
    /// Exited with a non-zero code.
    Crashed { code: i32 },
    /// Terminated without an exit code (e.g. killed by a signal).
    Terminated,
}

impl ChildExit {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => ChildExit::Completed,
            Some(code) => ChildExit::Crashed { code },
            None => ChildExit::Terminated,
        }
    }
}
