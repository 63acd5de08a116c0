// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::exec::{AppCommand, BuildCommand};
use crate::watch::path_utils::resolve_against;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// paths = ["."]
/// extensions = [".go"]
/// cooldown_secs = 1
///
/// [build]
/// program = "go"
/// args = ["build", "-o", "./app"]
///
/// [app]
/// path = "./app"
/// ```
///
/// All sections are optional at the deserialization level; missing required
/// values are reported when converting into a [`WatchConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub app: AppSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Root directories (or single files) to watch.
    #[serde(default = "default_paths")]
    pub paths: Vec<PathBuf>,

    /// File suffixes that count as relevant, e.g. `".go"`. `"*"` watches
    /// every file.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Expand directory roots into all their subdirectories.
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Coalesce near-simultaneous triggers with a pending-build marker.
    #[serde(default = "default_true")]
    pub dedup: bool,

    /// Minimum seconds between the last build activity and a new trigger.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Seconds to wait after a trigger before invoking the build command.
    #[serde(default)]
    pub delay_secs: Option<u64>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            extensions: Vec::new(),
            recursive: true,
            dedup: true,
            cooldown_secs: default_cooldown_secs(),
            delay_secs: None,
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Build program, e.g. `"go"` or `"cargo"`.
    #[serde(default)]
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Directory the build runs in. Defaults to the config file's directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Run one build as soon as the supervisor starts.
    #[serde(default = "default_true")]
    pub on_start: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            dir: None,
            on_start: true,
        }
    }
}

/// `[app]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSection {
    /// Path of the artifact produced by the build and spawned afterwards.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub args: Vec<String>,
}

fn default_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_true() -> bool {
    true
}

fn default_cooldown_secs() -> u64 {
    1
}

impl RawConfigFile {
    /// Make every relative path in the file absolute against `base`.
    ///
    /// The build directory defaults to `base` itself.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        self.watch.paths = self
            .watch
            .paths
            .iter()
            .map(|p| resolve_against(base, p))
            .collect();

        self.app.path = self.app.path.as_ref().map(|p| resolve_against(base, p));

        self.build.dir = Some(match &self.build.dir {
            Some(dir) => resolve_against(base, dir),
            None => base.to_path_buf(),
        });
    }
}

/// Validated, immutable runtime configuration.
///
/// Built once at startup via `WatchConfig::try_from(RawConfigFile)` and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
    recursive: bool,
    dedup: bool,
    cooldown: Duration,
    delay: Option<Duration>,
    build: BuildCommand,
    build_on_start: bool,
    app: AppCommand,
}

impl WatchConfig {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        roots: Vec<PathBuf>,
        extensions: Vec<String>,
        recursive: bool,
        dedup: bool,
        cooldown: Duration,
        delay: Option<Duration>,
        build: BuildCommand,
        build_on_start: bool,
        app: AppCommand,
    ) -> Self {
        Self {
            roots,
            extensions,
            recursive,
            dedup,
            cooldown,
            delay,
            build,
            build_on_start,
            app,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn dedup(&self) -> bool {
        self.dedup
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// How long a file-change build waits after its trigger.
    ///
    /// With dedup the build is scheduled for the end of the pending window,
    /// so every save in a burst lands in it; a configured delay shortens the
    /// window. Without dedup only the delay applies.
    pub fn trigger_wait(&self) -> Option<Duration> {
        if self.dedup {
            Some(self.delay.unwrap_or(self.cooldown))
        } else {
            self.delay
        }
    }

    pub fn build(&self) -> &BuildCommand {
        &self.build
    }

    pub fn build_on_start(&self) -> bool {
        self.build_on_start
    }

    pub fn app(&self) -> &AppCommand {
        &self.app
    }

    /// Path of the artifact the supervisor spawns.
    pub fn artifact(&self) -> &Path {
        &self.app.path
    }
}
