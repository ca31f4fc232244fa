//! Path resolution for Orca's local files.
//!
//! Data dir priority: `--data-dir` flag > `ORCA_DATA_DIR` env (both via clap)
//! > `~/.orca`.

use std::path::{Path, PathBuf};

use anyhow::Context;

pub fn resolve_data_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    let home = dirs::home_dir().context("HOME directory not found")?;
    Ok(home.join(".orca"))
}

pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("client.toml")
}
