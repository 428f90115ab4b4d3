//! Launcher configuration stored in `launcher.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, resolved against the working directory.
pub const CONFIG_FILE_NAME: &str = "launcher.toml";

/// Launcher configuration (TOML).
///
/// Every field is optional; a missing file or field falls back to the
/// hamster-monitor defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Block for acknowledgment after a failure.
    pub pause_on_failure: bool,

    /// Upper bound for each probe command (`--version`, `env list`).
    pub probe_timeout_secs: u64,

    pub interpreter: InterpreterConfig,
    pub environment: EnvironmentConfig,
    pub entry_point: EntryPointConfig,
    pub model: ModelConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Interpreter program probed before activation.
    pub program: String,
    /// Arguments that make the interpreter print its version and exit.
    pub version_args: Vec<String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            version_args: vec!["--version".to_string()],
        }
    }
}

/// How the runtime environment is located.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    Conda,
    Venv,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub kind: EnvironmentKind,
    /// Conda environment name, or venv directory relative to the working directory.
    pub name: String,
    /// Conda program. `CONDA_EXE` takes precedence while this is left as `conda`.
    pub manager: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            kind: EnvironmentKind::Conda,
            name: "hamster-monitor-env".to_string(),
            manager: "conda".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EntryPointConfig {
    pub path: PathBuf,
    /// Extra arguments forwarded to the entry point.
    pub args: Vec<String>,
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("main.py"),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("best.pt"),
        }
    }
}

/// Address the entry point is expected to listen on. Advisory only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8081,
        }
    }
}

impl ServerConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            pause_on_failure: true,
            probe_timeout_secs: 30,
            interpreter: InterpreterConfig::default(),
            environment: EnvironmentConfig::default(),
            entry_point: EntryPointConfig::default(),
            model: ModelConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl LauncherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.probe_timeout_secs == 0 {
            return Err(anyhow!("probe_timeout_secs must be > 0"));
        }
        if self.interpreter.program.trim().is_empty() {
            return Err(anyhow!("interpreter.program must be non-empty"));
        }
        if self.environment.kind != EnvironmentKind::None
            && self.environment.name.trim().is_empty()
        {
            return Err(anyhow!("environment.name must be non-empty"));
        }
        if self.environment.kind == EnvironmentKind::Conda
            && self.environment.manager.trim().is_empty()
        {
            return Err(anyhow!("environment.manager must be non-empty"));
        }
        if self.entry_point.path.as_os_str().is_empty() {
            return Err(anyhow!("entry_point.path must be non-empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be > 0"));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LauncherConfig::default()`.
pub fn load_config(path: &Path) -> Result<LauncherConfig> {
    if !path.exists() {
        let cfg = LauncherConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LauncherConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid {}", path.display()))?;
    Ok(cfg)
}

/// Load a config file the user named explicitly; unlike [`load_config`], a missing file is an error.
pub fn load_named_config(path: &Path) -> Result<LauncherConfig> {
    if !path.is_file() {
        return Err(anyhow!("config file {} does not exist", path.display()));
    }
    load_config(path)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LauncherConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
