//! Test-only helpers: scripted collaborators and a scratch workspace.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::types::ChildExit;
use crate::io::config::{InterpreterConfig, LauncherConfig};
use crate::io::console::Console;
use crate::io::entry_point::{EntryPointSpawner, LaunchRequest};
use crate::io::environment::{ActivatedEnvironment, EnvironmentActivator};
use crate::io::interpreter::InterpreterProbe;

/// Temporary working directory for a launch.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write the default entry point (`main.py`).
    pub fn with_entry_point(&self) -> Result<PathBuf> {
        self.write("main.py", "print('hamster monitor')\n")
    }

    /// Write the default model file (`best.pt`).
    pub fn with_model(&self) -> Result<PathBuf> {
        self.write("best.pt", "weights")
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

/// Interpreter probe with a fixed answer.
pub struct ScriptedProbe {
    result: std::result::Result<String, String>,
    calls: Cell<usize>,
}

impl ScriptedProbe {
    pub fn ok(banner: &str) -> Self {
        Self {
            result: Ok(banner.to_string()),
            calls: Cell::new(0),
        }
    }

    pub fn missing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl InterpreterProbe for ScriptedProbe {
    fn probe(&self, _interpreter: &InterpreterConfig, _timeout: Duration) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone().map_err(|reason| anyhow!(reason))
    }
}

/// Environment activator with a fixed answer.
pub struct ScriptedActivator {
    error: Option<String>,
    calls: Cell<usize>,
}

impl ScriptedActivator {
    pub fn ok() -> Self {
        Self {
            error: None,
            calls: Cell::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            error: Some(reason.to_string()),
            calls: Cell::new(0),
        }
    }

    /// Interpreter path reported by a successful activation.
    pub fn interpreter() -> PathBuf {
        PathBuf::from("/envs/hamster-monitor-env/bin/python")
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl EnvironmentActivator for ScriptedActivator {
    fn activate(&self, _root: &Path, _config: &LauncherConfig) -> Result<ActivatedEnvironment> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = &self.error {
            return Err(anyhow!(reason.clone()));
        }
        Ok(ActivatedEnvironment {
            prefix: Some(PathBuf::from("/envs/hamster-monitor-env")),
            interpreter: Self::interpreter(),
            vars: Vec::new(),
        })
    }
}

/// Spawner that records requests instead of starting processes.
pub struct ScriptedSpawner {
    result: std::result::Result<ChildExit, String>,
    requests: RefCell<Vec<LaunchRequest>>,
}

impl ScriptedSpawner {
    pub fn exiting(exit: ChildExit) -> Self {
        Self {
            result: Ok(exit),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.borrow().clone()
    }

    pub fn spawned(&self) -> bool {
        !self.requests.borrow().is_empty()
    }
}

impl EntryPointSpawner for ScriptedSpawner {
    fn spawn(&self, request: &LaunchRequest) -> Result<ChildExit> {
        self.requests.borrow_mut().push(request.clone());
        self.result.clone().map_err(|reason| anyhow!(reason))
    }
}

/// One recorded console interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Notice(String),
    Warning(String),
    Error(String),
    Acknowledged,
}

/// Console that records output and never blocks.
#[derive(Default)]
pub struct RecordingConsole {
    lines: RefCell<Vec<ConsoleLine>>,
}

impl RecordingConsole {
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.borrow().clone()
    }

    pub fn acknowledgments(&self) -> usize {
        self.lines
            .borrow()
            .iter()
            .filter(|line| **line == ConsoleLine::Acknowledged)
            .count()
    }

    pub fn has_error(&self, needle: &str) -> bool {
        self.lines
            .borrow()
            .iter()
            .any(|line| matches!(line, ConsoleLine::Error(text) if text.contains(needle)))
    }

    pub fn has_warning(&self, needle: &str) -> bool {
        self.lines
            .borrow()
            .iter()
            .any(|line| matches!(line, ConsoleLine::Warning(text) if text.contains(needle)))
    }

    pub fn has_notice(&self, needle: &str) -> bool {
        self.lines
            .borrow()
            .iter()
            .any(|line| matches!(line, ConsoleLine::Notice(text) if text.contains(needle)))
    }
}

impl Console for RecordingConsole {
    fn notice(&self, message: &str) {
        self.lines
            .borrow_mut()
            .push(ConsoleLine::Notice(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.lines
            .borrow_mut()
            .push(ConsoleLine::Warning(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.lines
            .borrow_mut()
            .push(ConsoleLine::Error(message.to_string()));
    }

    fn acknowledge(&self) -> Result<()> {
        self.lines.borrow_mut().push(ConsoleLine::Acknowledged);
        Ok(())
    }
}
