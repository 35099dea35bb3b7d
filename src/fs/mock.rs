// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem shared between clones.
///
/// A fake worker can hold one clone and "produce" outputs while the driver
/// probes the same tree through another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(path.clone(), MockEntry::File(content.into()));

        if let Some(parent) = path.parent() {
            let parent = normalize_parent(parent);
            Self::ensure_dir_entry(&mut files, parent);
            Self::link_child(&mut files, parent, &path);
        }
    }

    /// Create an (empty) directory and its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Number of files (not directories) currently stored.
    pub fn file_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| matches!(entry, MockEntry::File(_)))
            .count()
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = path.parent() {
            let parent = normalize_parent(parent);
            if parent != path {
                Self::ensure_dir_entry(files, parent);
                Self::link_child(files, parent, path);
            }
        }
    }

    fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
        if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

fn normalize_parent(parent: &Path) -> &Path {
    if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
