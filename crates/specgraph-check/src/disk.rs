//! # On-Disk Lookups
//!
//! Link and footnote targets may name files that are not markdown (test
//! sources, images) or markdown that was never loaded. [`Disk`] answers
//! existence questions for those against the repository root.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use specgraph_core::DocPath;

/// What sits at a repository-relative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file (or a symlink to one).
    File,
    /// A directory.
    Dir,
    /// Nothing.
    Missing,
}

/// Read-only view of the repository tree.
#[derive(Debug, Clone)]
pub struct Disk {
    root: PathBuf,
}

impl Disk {
    /// A view rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Classify `path`.
    pub fn entry(&self, path: &DocPath) -> EntryKind {
        match fs::metadata(path.to_fs_path(&self.root)) {
            Ok(meta) if meta.is_dir() => EntryKind::Dir,
            Ok(_) => EntryKind::File,
            Err(_) => EntryKind::Missing,
        }
    }

    /// Whether the file at `path` defines a test called `name`
    /// (`def name` or `fn name`).
    pub fn defines_test(&self, path: &DocPath, name: &str) -> bool {
        let Ok(bytes) = fs::read(path.to_fs_path(&self.root)) else {
            return false;
        };
        let source = String::from_utf8_lossy(&bytes);
        let pattern = format!(r"\b(?:def|fn)\s+{}\b", regex::escape(name));
        match Regex::new(&pattern) {
            Ok(re) => re.is_match(&source),
            Err(e) => {
                tracing::debug!(name, error = %e, "test name is not searchable");
                false
            }
        }
    }
}
