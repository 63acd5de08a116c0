// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawConfigFile, WatchConfig};
use crate::errors::{BuildwatchError, Result};

/// Config file picked up from the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "Buildwatch.toml";

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// Relative paths inside the file are resolved against the file's own
/// directory. No semantic validation happens here; see [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let mut config: RawConfigFile = toml::from_str(&contents)?;
    config.resolve_relative_to(&config_root_dir(path));

    Ok(config)
}

/// Load a configuration file and validate it into a [`WatchConfig`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WatchConfig> {
    let raw_config = load_from_path(&path)?;
    WatchConfig::try_from(raw_config)
}

/// Decide which config file to read, if any.
///
/// - An explicitly requested file must exist.
/// - Otherwise `Buildwatch.toml` in `cwd` is used when present.
/// - Otherwise there is no file and everything comes from the CLI.
pub fn locate_config(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(BuildwatchError::ConfigError(format!(
                "config file {:?} does not exist",
                path
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    Ok(candidate.is_file().then_some(candidate))
}

/// Directory that relative paths in a config file are resolved against.
///
/// A bare file name like `Buildwatch.toml` has an empty parent, in which case
/// the current working directory is used.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
