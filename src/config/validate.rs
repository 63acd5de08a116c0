// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{RawConfigFile, WatchConfig};
use crate::errors::{BuildwatchError, Result};
use crate::exec::{AppCommand, BuildCommand};
use crate::watch::filter::WILDCARD;
use crate::watch::path_utils::normalize_artifact;

impl TryFrom<RawConfigFile> for WatchConfig {
    type Error = BuildwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let RawConfigFile { watch, build, app } = raw;

        let artifact = app
            .path
            .as_deref()
            .map(normalize_artifact)
            .ok_or_else(missing_app_path)?;

        let extensions = watch
            .extensions
            .iter()
            .map(|e| e.trim().to_string())
            .collect();

        Ok(WatchConfig::new_unchecked(
            watch.paths,
            extensions,
            watch.recursive,
            watch.dedup,
            Duration::from_secs(watch.cooldown_secs),
            watch.delay_secs.filter(|s| *s > 0).map(Duration::from_secs),
            BuildCommand {
                program: build.program.trim().to_string(),
                args: build.args,
                dir: build.dir,
            },
            build.on_start,
            AppCommand {
                path: artifact,
                args: app.args,
            },
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch_section(cfg)?;
    validate_build_section(cfg)?;
    validate_app_section(cfg)?;
    validate_timing(cfg)?;
    Ok(())
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.paths.is_empty() {
        return Err(BuildwatchError::ConfigError(
            "[watch].paths must list at least one directory or file".to_string(),
        ));
    }

    if cfg.watch.extensions.is_empty() {
        return Err(BuildwatchError::ConfigError(format!(
            "[watch].extensions must list at least one extension (use \"{WILDCARD}\" to watch everything)"
        )));
    }

    if let Some(pos) = cfg.watch.extensions.iter().position(|e| e.trim().is_empty()) {
        return Err(BuildwatchError::ConfigError(format!(
            "[watch].extensions[{pos}] is empty"
        )));
    }

    Ok(())
}

fn validate_build_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.build.program.trim().is_empty() {
        return Err(BuildwatchError::ConfigError(
            "[build].program is required (e.g. \"go\" or \"cargo\")".to_string(),
        ));
    }
    Ok(())
}

fn validate_app_section(cfg: &RawConfigFile) -> Result<()> {
    match &cfg.app.path {
        None => Err(missing_app_path()),
        Some(path) if path.file_name().is_none() => Err(BuildwatchError::ConfigError(
            format!("[app].path {path:?} does not name a file"),
        )),
        Some(_) => Ok(()),
    }
}

fn missing_app_path() -> BuildwatchError {
    BuildwatchError::ConfigError(
        "[app].path is required: the artifact produced by the build".to_string(),
    )
}

fn validate_timing(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.watch.dedup {
        return Ok(());
    }

    // The pending marker lives for `cooldown_secs`; a zero window coalesces
    // nothing.
    if cfg.watch.cooldown_secs == 0 {
        return Err(BuildwatchError::ConfigError(
            "[watch].cooldown_secs must be at least 1 when dedup is enabled".to_string(),
        ));
    }

    // The delayed build must start while the marker still holds.
    let delay = cfg.watch.delay_secs.unwrap_or(0);
    if delay > 0 && delay >= cfg.watch.cooldown_secs {
        return Err(BuildwatchError::ConfigError(format!(
            "[watch].delay_secs ({delay}) must be less than cooldown_secs ({}) when dedup is enabled",
            cfg.watch.cooldown_secs
        )));
    }

    Ok(())
}
