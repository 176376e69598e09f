//! Where bedscan looks for `config.toml` and for engine libraries given by
//! bare file name.
//!
//! `BEDSCAN_CONFIG_DIR` and `BEDSCAN_DATA_DIR` replace the platform
//! directories when set to a non-empty value.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

const CONFIG_DIR_ENV: &str = "BEDSCAN_CONFIG_DIR";
const DATA_DIR_ENV: &str = "BEDSCAN_DATA_DIR";
const ENGINES_DIR: &str = "engines";

fn override_from(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn platform_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("io", "bedscan", "bedscan")
        .ok_or_else(|| anyhow!("no home directory to place bedscan files in"))
}

/// Directory holding the user's `config.toml`.
pub fn get_config_dir() -> Result<PathBuf> {
    match override_from(CONFIG_DIR_ENV) {
        Some(dir) => Ok(dir),
        None => Ok(platform_dirs()?.config_local_dir().to_path_buf()),
    }
}

/// Directory searched for engine libraries named without a directory part.
pub fn get_engines_dir() -> Result<PathBuf> {
    let data = match override_from(DATA_DIR_ENV) {
        Some(dir) => dir,
        None => platform_dirs()?.data_local_dir().to_path_buf(),
    };
    Ok(data.join(ENGINES_DIR))
}
