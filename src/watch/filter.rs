// src/watch/filter.rs

use std::path::{Path, PathBuf};

use crate::config::WatchConfig;

/// Extension pattern that makes every file relevant.
pub const WILDCARD: &str = "*";

/// Decides whether a path is relevant to the watch set.
///
/// Extension patterns are plain suffixes (`".go"`, `"_test.go"`, `".tmpl"`)
/// matched against the whole path string, not globs.
#[derive(Debug, Clone)]
pub struct PathFilter {
    extensions: Vec<String>,
    watch_all: bool,
    artifact: PathBuf,
}

impl PathFilter {
    pub fn new<I, S>(extensions: I, artifact: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: Vec<String> = extensions.into_iter().map(Into::into).collect();
        let watch_all = extensions.iter().any(|e| e == WILDCARD);
        Self {
            extensions,
            watch_all,
            artifact: artifact.into(),
        }
    }

    pub fn from_config(cfg: &WatchConfig) -> Self {
        Self::new(cfg.extensions().iter().cloned(), cfg.artifact())
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Returns true if changes to `path` should not cause a build.
    ///
    /// The artifact itself is always ignorable, even under `"*"`, so that
    /// writing the fresh binary never re-triggers the build that produced it.
    pub fn is_ignorable(&self, path: &Path) -> bool {
        if path == self.artifact {
            return true;
        }
        if self.watch_all {
            return false;
        }

        let path = path.to_string_lossy();
        !self
            .extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
    }
}
