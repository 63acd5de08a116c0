// src/watch/mod.rs

//! File watching and trigger gating.
//!
//! This module is responsible for:
//! - deciding which paths matter (`filter`),
//! - deciding which directories are worth watching (`path_utils`, `scanner`),
//! - turning raw `notify` events into build triggers (`debounce`),
//! - the loop that drains the watcher and launches builds (`watcher`).
//!
//! It does not run processes itself; that is `crate::exec`.

pub mod debounce;
pub mod filter;
pub mod path_utils;
pub mod scanner;
pub mod watcher;

use std::path::PathBuf;

use tracing::info;

use crate::config::WatchConfig;
use crate::errors::{BuildwatchError, Result};
use crate::fs::FileSystem;

pub use debounce::{
    BuildState, ChangeEvent, ChangeKind, Decision, EventDebouncer, IgnoreReason, SharedBuildState,
};
pub use filter::{PathFilter, WILDCARD};
pub use path_utils::{expand_roots, WatchRoots};
pub use scanner::DirectoryScanner;
pub use watcher::{start_watcher, watch_channels, LoopExit, WatchLoop, WatchSenders, WatchStreams, WatcherHandle};

/// Compute the set of directories and files to register with the watcher.
///
/// Roots are expanded (recursively if configured), directories without any
/// relevant file are dropped, and file roots are kept unless the filter
/// ignores them. An empty result is a setup error.
pub fn compute_watch_set(
    fs: &dyn FileSystem,
    cfg: &WatchConfig,
    filter: &PathFilter,
) -> Result<WatchRoots> {
    let candidates = expand_roots(fs, cfg.roots(), cfg.recursive())?;

    let dirs = DirectoryScanner::new(fs, filter).filter_watchable(&candidates.dirs);
    let files: Vec<PathBuf> = candidates
        .files
        .into_iter()
        .filter(|f| !filter.is_ignorable(f))
        .collect();

    if dirs.is_empty() && files.is_empty() {
        return Err(BuildwatchError::EmptyWatchSet(cfg.roots().to_vec()));
    }

    info!(
        candidates = candidates.dirs.len(),
        dirs = dirs.len(),
        files = files.len(),
        "computed watch set"
    );
    Ok(WatchRoots { dirs, files })
}
