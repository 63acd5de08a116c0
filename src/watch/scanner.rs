// src/watch/scanner.rs

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::fs::FileSystem;
use crate::watch::filter::PathFilter;

/// Reduces candidate directories to those worth registering with the
/// watcher: directories holding at least one file the filter cares about.
#[derive(Debug)]
pub struct DirectoryScanner<'a> {
    fs: &'a dyn FileSystem,
    filter: &'a PathFilter,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(fs: &'a dyn FileSystem, filter: &'a PathFilter) -> Self {
        Self { fs, filter }
    }

    /// Keep only watchable directories, preserving input order.
    ///
    /// Directories that cannot be listed are reported and dropped; scanning
    /// carries on with the rest.
    pub fn filter_watchable(&self, dirs: &[PathBuf]) -> Vec<PathBuf> {
        dirs.iter()
            .filter(|dir| self.is_watchable(dir))
            .cloned()
            .collect()
    }

    fn is_watchable(&self, dir: &Path) -> bool {
        let entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                error!(dir = ?dir, error = %err, "cannot list directory; not watching it");
                return false;
            }
        };

        let watchable = entries
            .iter()
            .filter(|entry| !self.fs.is_dir(entry))
            .any(|entry| !self.filter.is_ignorable(entry));

        if !watchable {
            debug!(dir = ?dir, "no relevant files; not watching");
        }
        watchable
    }
}
