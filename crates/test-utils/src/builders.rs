#![allow(dead_code)]

use std::path::PathBuf;

use buildwatch::config::{RawConfigFile, WatchConfig};

/// Builder for `WatchConfig` to simplify test setup.
///
/// Starts from a valid config: `.go` files, `go build`, an artifact at
/// `/srv/demo/app`, cooldown 1s, dedup on.
pub struct WatchConfigBuilder {
    raw: RawConfigFile,
}

impl WatchConfigBuilder {
    pub fn new() -> Self {
        let mut raw = RawConfigFile::default();
        raw.watch.paths = vec![PathBuf::from("/srv/demo")];
        raw.watch.extensions = vec![".go".to_string()];
        raw.build.program = "go".to_string();
        raw.build.args = vec!["build".to_string()];
        raw.app.path = Some(PathBuf::from("/srv/demo/app"));
        Self { raw }
    }

    pub fn paths(mut self, paths: &[&str]) -> Self {
        self.raw.watch.paths = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn extensions(mut self, exts: &[&str]) -> Self {
        self.raw.watch.extensions = exts.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn artifact(mut self, path: &str) -> Self {
        self.raw.app.path = Some(PathBuf::from(path));
        self
    }

    pub fn app_arg(mut self, arg: &str) -> Self {
        self.raw.app.args.push(arg.to_string());
        self
    }

    pub fn build_program(mut self, program: &str) -> Self {
        self.raw.build.program = program.to_string();
        self
    }

    pub fn build_args(mut self, args: &[&str]) -> Self {
        self.raw.build.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn cooldown_secs(mut self, secs: u64) -> Self {
        self.raw.watch.cooldown_secs = secs;
        self
    }

    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.raw.watch.delay_secs = Some(secs);
        self
    }

    pub fn dedup(mut self, val: bool) -> Self {
        self.raw.watch.dedup = val;
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.raw.watch.recursive = val;
        self
    }

    pub fn build_on_start(mut self, val: bool) -> Self {
        self.raw.build.on_start = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.raw
    }

    pub fn build(self) -> WatchConfig {
        WatchConfig::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

impl Default for WatchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
