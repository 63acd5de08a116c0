// src/config/mod.rs

//! Configuration loading and validation for buildwatch.
//!
//! - `model.rs`: the TOML-backed data model and the validated `WatchConfig`.
//! - `loader.rs`: locating and reading the config file.
//! - `validate.rs`: `RawConfigFile -> WatchConfig` conversion with checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    config_root_dir, load_and_validate, load_from_path, locate_config, DEFAULT_CONFIG_FILE,
};
pub use model::{AppSection, BuildSection, RawConfigFile, WatchConfig, WatchSection};
