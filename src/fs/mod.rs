// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
///
/// The readiness probe lists the run's result directory through this trait,
/// and reports are written through it, so tests can swap in
/// [`mock::MockFileSystem`].
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// File names (not paths) in `path`, sorted. A missing directory lists
    /// as empty: the run directory is only created once the first task
    /// writes into it.
    fn list_names(&self, path: &Path) -> Result<Vec<String>> {
        if !self.is_dir(path) {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = self
            .read_dir(path)?
            .into_iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let iter = match fs::read_dir(path) {
            Ok(iter) => iter,
            // Removed between `is_dir` and here.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading dir {:?}", path));
            }
        };
        let mut entries = Vec::new();
        for entry in iter {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
