//! # Document Loader
//!
//! Enumerates markdown files under a root directory in sorted order and reads
//! them into [`Document`]s. Enumeration is lazy: [`DocumentLoader::paths`]
//! walks the tree as the caller pulls, so the pool can start extracting
//! before the walk finishes.
//!
//! Directories named `.git`, `node_modules`, or `target` are never entered.
//! User exclude globs are matched against the repository-relative path of
//! every file and directory.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

use specgraph_core::{DocPath, Document, LoadError};

use crate::error::ScanError;

/// Directory names skipped during enumeration.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 3] = [".git", "node_modules", "target"];

/// Finds and reads the markdown documents of one repository.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    root: PathBuf,
    excludes: GlobSet,
}

impl DocumentLoader {
    /// Create a loader for `root` with user exclude globs.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidExclude`] if a pattern does not compile.
    pub fn new(root: impl Into<PathBuf>, exclude_patterns: &[String]) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude_patterns {
            let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidExclude {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let excludes = builder.build().map_err(|source| ScanError::InvalidExclude {
            pattern: exclude_patterns.join(","),
            source,
        })?;
        Ok(Self {
            root: root.into(),
            excludes,
        })
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Verify the root exists and can be listed.
    ///
    /// # Errors
    ///
    /// [`LoadError::RootNotFound`] or [`LoadError::RootUnreadable`].
    pub fn check_root(&self) -> Result<(), LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::RootNotFound {
                path: self.root.clone(),
            });
        }
        fs::read_dir(&self.root)
            .map(|_| ())
            .map_err(|source| LoadError::RootUnreadable {
                path: self.root.clone(),
                source,
            })
    }

    /// Whether a repository-relative path is excluded from loading.
    pub fn is_excluded(&self, path: &DocPath) -> bool {
        if path.is_root() {
            return false;
        }
        let raw = path.as_str();
        if raw
            .split('/')
            .any(|segment| DEFAULT_EXCLUDED_DIRS.contains(&segment))
        {
            return true;
        }
        // A file is excluded when it or any ancestor directory matches.
        raw.match_indices('/')
            .map(|(idx, _)| &raw[..idx])
            .chain(std::iter::once(raw))
            .any(|prefix| self.excludes.is_match(prefix))
    }

    /// Lazily enumerate markdown files, sorted by name at every level.
    ///
    /// Entries that cannot be traversed are yielded as errors and skipped.
    pub fn paths(&self) -> impl Iterator<Item = Result<DocPath, LoadError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.keep_entry(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() && has_md_extension(entry.path()) => {
                    Some(DocPath::from_fs(&self.root, entry.path()).map_err(|e| {
                        LoadError::Traversal {
                            path: entry.path().to_path_buf(),
                            reason: e.to_string(),
                        }
                    }))
                }
                Ok(_) => None,
                Err(err) => Some(Err(LoadError::Traversal {
                    path: err
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf),
                    reason: err
                        .io_error()
                        .map_or_else(|| err.to_string(), ToString::to_string),
                })),
            })
    }

    /// Read one document.
    ///
    /// # Errors
    ///
    /// [`LoadError::FileUnreadable`] on I/O failure, [`LoadError::NotUtf8`]
    /// if the bytes are not UTF-8.
    pub fn load(&self, path: &DocPath) -> Result<Document, LoadError> {
        let fs_path = path.to_fs_path(&self.root);
        let bytes = fs::read(&fs_path).map_err(|source| LoadError::FileUnreadable {
            path: fs_path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| LoadError::NotUtf8 { path: fs_path })?;
        Ok(Document::new(path.clone(), text))
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        match DocPath::from_fs(&self.root, entry.path()) {
            Ok(rel) => !self.is_excluded(&rel),
            Err(_) => true,
        }
    }
}

fn has_md_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}
