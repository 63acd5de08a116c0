// src/watch/path_utils.rs

//! Path helpers used while building the watch set.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{BuildwatchError, Result};
use crate::fs::FileSystem;

/// Join `path` onto `base` unless it is already absolute.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Best-effort canonical form of the artifact path.
///
/// The artifact usually does not exist yet on first start, so only its
/// parent directory is canonicalized. Event paths reported by the watcher
/// are canonical, and the artifact must compare equal to them.
pub fn normalize_artifact(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };

    match parent.canonicalize() {
        Ok(parent) => parent.join(name),
        Err(_) => path.to_path_buf(),
    }
}

/// Candidate locations to register with the watcher, before scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchRoots {
    /// Directories to be reduced by the directory scanner.
    pub dirs: Vec<PathBuf>,
    /// Individual files named directly as roots.
    pub files: Vec<PathBuf>,
}

/// Turn the configured roots into candidate directories and files.
///
/// - Each root is canonicalized (falling back to the path as given).
/// - A directory root becomes itself plus, when `recursive`, every
///   descendant directory. Hidden directories such as `.git` are skipped.
/// - A file root is kept as a file.
/// - A root that does not exist is a setup error.
///
/// Duplicates (e.g. `["."]` together with `["./src"]`) are dropped, keeping
/// first-seen order.
pub fn expand_roots(fs: &dyn FileSystem, roots: &[PathBuf], recursive: bool) -> Result<WatchRoots> {
    let mut out = WatchRoots::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for root in roots {
        let root = fs.canonicalize(root).unwrap_or_else(|_| root.clone());

        if fs.is_file(&root) {
            if seen.insert(root.clone()) {
                out.files.push(root);
            }
            continue;
        }

        if !fs.is_dir(&root) {
            return Err(BuildwatchError::ConfigError(format!(
                "watch path {:?} does not exist",
                root
            )));
        }

        let mut stack = vec![root];
        while let Some(dir) = stack.pop() {
            if !seen.insert(dir.clone()) {
                continue;
            }
            out.dirs.push(dir.clone());

            if !recursive {
                continue;
            }

            let entries = match fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    // The scanner reports this directory again; just stop descending.
                    debug!(dir = ?dir, error = %err, "cannot descend into directory");
                    continue;
                }
            };

            // Reverse so that popping visits children in sorted order.
            for child in entries.into_iter().rev() {
                if fs.is_dir(&child) && !is_hidden(&child) {
                    stack.push(child);
                }
            }
        }
    }

    if out.dirs.is_empty() && out.files.is_empty() {
        warn!(?roots, "no directories or files to watch");
    }

    Ok(out)
}

fn is_hidden(path: &Path) -> bool {
    matches!(
        path.components().next_back(),
        Some(Component::Normal(name)) if name.to_string_lossy().starts_with('.')
    )
}
