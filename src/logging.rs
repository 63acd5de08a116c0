// src/logging.rs

//! Logging setup for `buildwatch` using `tracing` + `tracing-subscriber`.
//!
//! The level is picked from, in order:
//! 1. the `--log-level` CLI flag
//! 2. the `BUILDWATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. `info`
//!
//! Ignored filesystem events are reported at `debug`, so they only show up
//! when explicitly asked for.
//!
//! Everything goes to STDERR. The build command and the supervised app
//! inherit STDOUT, and their output should not be interleaved with ours more
//! than necessary.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "BUILDWATCH_LOG";

/// Initialise the global logging subscriber.
///
/// Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

/// Pick the effective level from the CLI flag and the raw env value.
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    match cli_level {
        Some(lvl) => lvl.into(),
        None => env_value.and_then(parse_level_str).unwrap_or(Level::INFO),
    }
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
