// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag here overrides the matching value from the config file, so a
//! quick session can run without any `Buildwatch.toml` at all:
//!
//! ```text
//! buildwatch --ext .go --build-program go --build-arg build --build-arg -o \
//!     --build-arg ./app --app ./app ./
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::config::RawConfigFile;
use crate::watch::path_utils::resolve_against;

/// Command-line arguments for `buildwatch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "buildwatch",
    version,
    about = "Rebuild and restart an app whenever its sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Directories or files to watch. Overrides `[watch].paths`.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Buildwatch.toml` in the current directory, if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Watched file extensions, e.g. `.go`. Use `*` to watch everything.
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Artifact produced by the build and spawned afterwards.
    #[arg(long, value_name = "PATH")]
    pub app: Option<PathBuf>,

    /// Argument passed to the spawned app (repeatable).
    #[arg(long = "app-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub app_args: Vec<String>,

    /// Build program, e.g. `go` or `cargo`.
    #[arg(long, value_name = "PROGRAM")]
    pub build_program: Option<String>,

    /// Argument passed to the build program (repeatable).
    #[arg(long = "build-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub build_args: Vec<String>,

    /// Seconds after a build during which further changes are ignored.
    #[arg(long, value_name = "SECS")]
    pub cooldown: Option<u64>,

    /// Seconds to wait after a change before building.
    #[arg(long, value_name = "SECS")]
    pub delay: Option<u64>,

    /// Disable the pending-build marker; every honoured change builds.
    #[arg(long)]
    pub no_dedup: bool,

    /// Skip the build that normally runs at startup.
    #[arg(long)]
    pub no_initial_build: bool,

    /// Watch only the given directories, not their subdirectories.
    #[arg(long)]
    pub no_recursive: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and the watch set, print them, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// Apply CLI overrides on top of a (possibly default) raw config.
    ///
    /// Paths given on the command line are resolved against `cwd`, not
    /// against the config file's directory.
    pub fn apply_overrides(&self, raw: &mut RawConfigFile, cwd: &Path) {
        if !self.paths.is_empty() {
            raw.watch.paths = self
                .paths
                .iter()
                .map(|p| resolve_against(cwd, p))
                .collect();
        }
        if !self.extensions.is_empty() {
            raw.watch.extensions = self.extensions.clone();
        }
        if let Some(app) = &self.app {
            raw.app.path = Some(resolve_against(cwd, app));
        }
        if !self.app_args.is_empty() {
            raw.app.args = self.app_args.clone();
        }
        if let Some(program) = &self.build_program {
            raw.build.program = program.clone();
        }
        if !self.build_args.is_empty() {
            raw.build.args = self.build_args.clone();
        }
        if let Some(secs) = self.cooldown {
            raw.watch.cooldown_secs = secs;
        }
        if let Some(secs) = self.delay {
            raw.watch.delay_secs = Some(secs);
        }
        if self.no_dedup {
            raw.watch.dedup = false;
        }
        if self.no_initial_build {
            raw.build.on_start = false;
        }
        if self.no_recursive {
            raw.watch.recursive = false;
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
