//! Entry-point handoff.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::types::ChildExit;
use crate::io::process::run_inherited;

/// Parameters for the single blocking launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub workdir: PathBuf,
    pub interpreter: PathBuf,
    pub entry_point: PathBuf,
    pub args: Vec<String>,
    pub vars: Vec<(String, OsString)>,
}

/// Abstraction over starting the entry point. Implementations block until it exits.
pub trait EntryPointSpawner {
    fn spawn(&self, request: &LaunchRequest) -> Result<ChildExit>;
}

/// Spawner that runs `<interpreter> <entry_point> <args>` with inherited stdio.
pub struct ProcessSpawner;

impl EntryPointSpawner for ProcessSpawner {
    #[instrument(skip_all, fields(entry_point = %request.entry_point.display()))]
    fn spawn(&self, request: &LaunchRequest) -> Result<ChildExit> {
        let mut cmd = Command::new(&request.interpreter);
        cmd.arg(&request.entry_point)
            .args(&request.args)
            .current_dir(&request.workdir);
        for (key, value) in &request.vars {
            cmd.env(key, value);
        }
        info!(interpreter = %request.interpreter.display(), "handing off to entry point");
        let status = run_inherited(cmd).context("run entry point")?;
        Ok(ChildExit::from_code(status.code()))
    }
}
