//! Runtime environment activation.
//!
//! A shell activation mutates the calling shell. The launcher cannot do that,
//! so activation here resolves the environment prefix and computes the
//! interpreter path and variables that the child process is started with.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::io::config::{EnvironmentKind, LauncherConfig};
use crate::io::process::{PROBE_OUTPUT_LIMIT_BYTES, run_command_with_timeout};

/// A resolved runtime environment, ready to start the entry point in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedEnvironment {
    /// Environment prefix; `None` when activation was skipped.
    pub prefix: Option<PathBuf>,
    /// Interpreter program to launch the entry point with.
    pub interpreter: PathBuf,
    /// Variables set on the child process.
    pub vars: Vec<(String, OsString)>,
}

impl ActivatedEnvironment {
    /// No activation: the child runs the configured interpreter from PATH.
    pub fn passthrough(program: &str) -> Self {
        Self {
            prefix: None,
            interpreter: PathBuf::from(program),
            vars: Vec::new(),
        }
    }

    pub fn describe(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("activated {}", prefix.display()),
            None => "skipped".to_string(),
        }
    }
}

/// Abstraction over environment managers.
pub trait EnvironmentActivator {
    fn activate(&self, root: &Path, config: &LauncherConfig) -> Result<ActivatedEnvironment>;
}

/// Activator backed by the host's conda installation or venv directories.
pub struct SystemActivator;

impl EnvironmentActivator for SystemActivator {
    #[instrument(skip_all, fields(kind = ?config.environment.kind, name = %config.environment.name))]
    fn activate(&self, root: &Path, config: &LauncherConfig) -> Result<ActivatedEnvironment> {
        let activated = match config.environment.kind {
            EnvironmentKind::None => {
                debug!("environment activation disabled");
                return Ok(ActivatedEnvironment::passthrough(
                    &config.interpreter.program,
                ));
            }
            EnvironmentKind::Conda => activate_conda(config)?,
            EnvironmentKind::Venv => activate_venv(root, &config.environment.name)?,
        };
        info!(interpreter = %activated.interpreter.display(), "environment activated");
        Ok(activated)
    }
}

#[derive(Debug, Deserialize)]
struct CondaEnvList {
    envs: Vec<PathBuf>,
}

fn activate_conda(config: &LauncherConfig) -> Result<ActivatedEnvironment> {
    let name = &config.environment.name;
    let manager = resolve_manager(&config.environment.manager, env::var_os("CONDA_EXE"));

    let mut cmd = Command::new(&manager);
    cmd.args(["env", "list", "--json"]);
    let output = run_command_with_timeout(cmd, config.probe_timeout(), PROBE_OUTPUT_LIMIT_BYTES)
        .context("run conda env list")?;
    if !output.success() {
        return Err(anyhow!("conda env list failed: {}", output.failure_reason()));
    }
    let envs = parse_env_list(&output.stdout)?;
    let prefix = find_conda_env(&envs, name)
        .ok_or_else(|| anyhow!("conda environment '{name}' does not exist"))?;

    let interpreter = conda_interpreter(&prefix);
    ensure_interpreter(&interpreter)?;
    let path = prepend_path(&conda_bin_dirs(&prefix), env::var_os("PATH"))?;
    Ok(ActivatedEnvironment {
        interpreter,
        vars: vec![
            ("CONDA_PREFIX".to_string(), prefix.clone().into_os_string()),
            ("CONDA_DEFAULT_ENV".to_string(), OsString::from(name)),
            ("PATH".to_string(), path),
        ],
        prefix: Some(prefix),
    })
}

fn activate_venv(root: &Path, name: &str) -> Result<ActivatedEnvironment> {
    let prefix = root.join(name);
    if !prefix.join("pyvenv.cfg").is_file() {
        return Err(anyhow!(
            "{} is not a virtual environment (missing pyvenv.cfg)",
            prefix.display()
        ));
    }
    let bin_dir = venv_bin_dir(&prefix);
    let interpreter = bin_dir.join(python_file_name());
    ensure_interpreter(&interpreter)?;
    let path = prepend_path(&[bin_dir], env::var_os("PATH"))?;
    Ok(ActivatedEnvironment {
        interpreter,
        vars: vec![
            ("VIRTUAL_ENV".to_string(), prefix.clone().into_os_string()),
            ("PATH".to_string(), path),
        ],
        prefix: Some(prefix),
    })
}

/// `CONDA_EXE` is set by `conda init` shells and points at the real binary.
///
/// Without it, Windows needs the explicit `conda.bat` name: PATH lookup there only
/// appends `.exe`, and conda's `condabin` entry point is a batch file.
fn resolve_manager(manager: &str, conda_exe: Option<OsString>) -> OsString {
    match conda_exe {
        Some(exe) if manager == "conda" && !exe.is_empty() => exe,
        _ if manager == "conda" && cfg!(windows) => OsString::from("conda.bat"),
        _ => OsString::from(manager),
    }
}

fn parse_env_list(stdout: &[u8]) -> Result<Vec<PathBuf>> {
    let list: CondaEnvList =
        serde_json::from_slice(stdout).context("parse conda env list output")?;
    Ok(list.envs)
}

/// Match an environment by directory name, absolute prefix, or `base` (the root prefix).
fn find_conda_env(envs: &[PathBuf], name: &str) -> Option<PathBuf> {
    if name == "base" {
        return envs.first().cloned();
    }
    let wanted = Path::new(name);
    if wanted.is_absolute() {
        return envs.iter().find(|prefix| prefix.as_path() == wanted).cloned();
    }
    envs.iter()
        .find(|prefix| prefix.file_name().is_some_and(|file| file == name))
        .cloned()
}

fn ensure_interpreter(interpreter: &Path) -> Result<()> {
    if !interpreter.is_file() {
        return Err(anyhow!(
            "environment has no interpreter at {}",
            interpreter.display()
        ));
    }
    Ok(())
}

fn prepend_path(dirs: &[PathBuf], current: Option<OsString>) -> Result<OsString> {
    let mut paths: Vec<PathBuf> = dirs.to_vec();
    if let Some(current) = current {
        paths.extend(env::split_paths(&current));
    }
    env::join_paths(paths).context("compose PATH")
}

fn python_file_name() -> &'static str {
    if cfg!(windows) { "python.exe" } else { "python" }
}

fn conda_interpreter(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join(python_file_name())
    } else {
        prefix.join("bin").join(python_file_name())
    }
}

fn conda_bin_dirs(prefix: &Path) -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![
            prefix.to_path_buf(),
            prefix.join("Library").join("mingw-w64").join("bin"),
            prefix.join("Library").join("usr").join("bin"),
            prefix.join("Library").join("bin"),
            prefix.join("Scripts"),
            prefix.join("bin"),
        ]
    } else {
        vec![prefix.join("bin")]
    }
}

fn venv_bin_dir(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join("Scripts")
    } else {
        prefix.join("bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn envs() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/opt/conda"),
            PathBuf::from("/opt/conda/envs/hamster-monitor-env"),
            PathBuf::from("/opt/conda/envs/other"),
        ]
    }

    #[test]
    fn find_env_by_name() {
        assert_eq!(
            find_conda_env(&envs(), "hamster-monitor-env"),
            Some(PathBuf::from("/opt/conda/envs/hamster-monitor-env"))
        );
        assert_eq!(find_conda_env(&envs(), "missing"), None);
    }

    #[test]
    fn base_maps_to_root_prefix() {
        assert_eq!(
            find_conda_env(&envs(), "base"),
            Some(PathBuf::from("/opt/conda"))
        );
        assert_eq!(find_conda_env(&[], "base"), None);
    }

    #[cfg(unix)]
    #[test]
    fn find_env_by_absolute_prefix() {
        assert_eq!(
            find_conda_env(&envs(), "/opt/conda/envs/other"),
            Some(PathBuf::from("/opt/conda/envs/other"))
        );
    }

    #[test]
    fn parse_env_list_reads_envs() {
        let json = br#"{"envs": ["/opt/conda", "/opt/conda/envs/x"]}"#;
        let parsed = parse_env_list(json).expect("parse");
        assert_eq!(parsed.len(), 2);
        assert!(parse_env_list(b"not json").is_err());
    }

    #[test]
    fn conda_exe_overrides_default_manager_only() {
        let exe = Some(OsString::from("/opt/conda/bin/conda"));
        assert_eq!(
            resolve_manager("conda", exe.clone()),
            OsString::from("/opt/conda/bin/conda")
        );
        assert_eq!(resolve_manager("mamba", exe), OsString::from("mamba"));
        let bare = if cfg!(windows) { "conda.bat" } else { "conda" };
        assert_eq!(resolve_manager("conda", None), OsString::from(bare));
        assert_eq!(
            resolve_manager("conda", Some(OsString::new())),
            OsString::from(bare)
        );
    }

    #[test]
    fn prepend_path_puts_dirs_first() {
        let current = env::join_paths([PathBuf::from("/usr/bin")]).expect("join");
        let joined = prepend_path(&[PathBuf::from("/env/bin")], Some(current)).expect("path");
        let parts: Vec<PathBuf> = env::split_paths(&joined).collect();
        assert_eq!(
            parts,
            vec![PathBuf::from("/env/bin"), PathBuf::from("/usr/bin")]
        );
    }

    #[test]
    fn none_kind_passes_interpreter_through() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = LauncherConfig::default();
        config.environment.kind = EnvironmentKind::None;
        config.interpreter.program = "python3".to_string();
        let activated = SystemActivator
            .activate(temp.path(), &config)
            .expect("activate");
        assert_eq!(activated, ActivatedEnvironment::passthrough("python3"));
        assert_eq!(activated.describe(), "skipped");
    }

    #[test]
    fn venv_requires_pyvenv_cfg() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join(".venv")).expect("mkdir");
        let mut config = LauncherConfig::default();
        config.environment.kind = EnvironmentKind::Venv;
        config.environment.name = ".venv".to_string();
        let err = SystemActivator
            .activate(temp.path(), &config)
            .expect_err("should fail");
        assert!(err.to_string().contains("pyvenv.cfg"));
    }

    #[test]
    fn venv_activation_sets_virtual_env() {
        let temp = tempfile::tempdir().expect("tempdir");
        let prefix = temp.path().join(".venv");
        let bin = venv_bin_dir(&prefix);
        fs::create_dir_all(&bin).expect("mkdir");
        fs::write(prefix.join("pyvenv.cfg"), "home = /usr/bin\n").expect("write cfg");
        fs::write(bin.join(python_file_name()), "").expect("write python");

        let mut config = LauncherConfig::default();
        config.environment.kind = EnvironmentKind::Venv;
        config.environment.name = ".venv".to_string();
        let activated = SystemActivator
            .activate(temp.path(), &config)
            .expect("activate");
        assert_eq!(activated.prefix.as_deref(), Some(prefix.as_path()));
        assert_eq!(activated.interpreter, bin.join(python_file_name()));
        assert!(
            activated
                .vars
                .iter()
                .any(|(key, value)| key == "VIRTUAL_ENV" && value == prefix.as_os_str())
        );
    }

    #[cfg(unix)]
    #[test]
    fn conda_activation_uses_manager_output() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let prefix = temp.path().join("envs").join("hamster-monitor-env");
        fs::create_dir_all(prefix.join("bin")).expect("mkdir");
        fs::write(prefix.join("bin").join("python"), "").expect("write python");

        let manager = temp.path().join("fake-conda");
        let script = format!(
            "#!/bin/sh\necho '{{\"envs\": [\"{}\", \"{}\"]}}'\n",
            temp.path().display(),
            prefix.display()
        );
        fs::write(&manager, script).expect("write manager");
        fs::set_permissions(&manager, fs::Permissions::from_mode(0o755)).expect("chmod");

        let mut config = LauncherConfig::default();
        config.environment.manager = manager.display().to_string();
        let activated = SystemActivator
            .activate(temp.path(), &config)
            .expect("activate");
        assert_eq!(activated.prefix.as_deref(), Some(prefix.as_path()));
        assert_eq!(activated.interpreter, prefix.join("bin").join("python"));
        assert!(
            activated
                .vars
                .iter()
                .any(|(key, value)| key == "CONDA_DEFAULT_ENV" && value == "hamster-monitor-env")
        );
    }

    #[cfg(unix)]
    #[test]
    fn conda_activation_fails_for_unknown_env() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let manager = temp.path().join("fake-conda");
        fs::write(&manager, "#!/bin/sh\necho '{\"envs\": []}'\n").expect("write manager");
        fs::set_permissions(&manager, fs::Permissions::from_mode(0o755)).expect("chmod");

        let mut config = LauncherConfig::default();
        config.environment.manager = manager.display().to_string();
        let err = SystemActivator
            .activate(temp.path(), &config)
            .expect_err("should fail");
        assert!(err.to_string().contains("does not exist"));
    }
}
