//! Scaffolding for `launcher init`.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::info;

use super::config::{LauncherConfig, write_config};

/// Options for `init_config`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing config file.
    pub force: bool,
}

/// Write a default config to `path`.
///
/// Fails if the file already exists unless `options.force` is set.
pub fn init_config(path: &Path, options: &InitOptions) -> Result<PathBuf> {
    if path.exists() && !options.force {
        return Err(anyhow!(
            "launcher init: {} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    if path.is_dir() {
        return Err(anyhow!(
            "launcher init: {} exists but is a directory",
            path.display()
        ));
    }
    write_config(path, &LauncherConfig::default())?;
    info!(path = %path.display(), "config written");
    Ok(path.to_path_buf())
}
