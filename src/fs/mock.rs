// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum MockEntry {
    File,
    Dir,
}

/// In-memory tree of files and directories.
///
/// Parents are created implicitly. Directories can be marked unreadable to
/// simulate permission errors on listing.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
    unreadable: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut entries, parent);
        }
        entries.insert(path.to_path_buf(), MockEntry::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        insert_dirs(&mut entries, path.as_ref());
    }

    /// Make `read_dir` on this directory fail.
    pub fn deny_listing(&self, path: impl AsRef<Path>) {
        self.unreadable
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    fn contains(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }
}

fn insert_dirs(entries: &mut BTreeMap<PathBuf, MockEntry>, dir: &Path) {
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

impl FileSystem for MockFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        matches!(self.entries.lock().unwrap().get(path), Some(MockEntry::File))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.lock().unwrap().get(path), Some(MockEntry::Dir))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Tests use absolute paths throughout.
        if self.contains(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("No such file or directory: {:?}", path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if self.unreadable.lock().unwrap().contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }

        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir) => Ok(entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
