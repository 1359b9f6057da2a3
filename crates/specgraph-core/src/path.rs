//! # Repository-Relative Paths
//!
//! [`DocPath`] is the only way a location inside the catalog is named. It is
//! always relative to the repository root, uses `/` as separator, and has
//! been normalized: no empty segments, no `.`, no `..`. Two links that reach
//! the same file by different routes therefore compare equal.
//!
//! The root directory itself is the empty path and displays as `.`.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// A normalized, repository-relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocPath(String);

impl DocPath {
    /// Parse and normalize a `/`-separated relative path.
    ///
    /// A leading `/` is ignored (the path is taken as root-relative).
    ///
    /// # Errors
    ///
    /// Returns [`PathError::OutsideRoot`] if `..` segments climb above the root.
    pub fn new(raw: &str) -> Result<Self, PathError> {
        let mut segments: Vec<&str> = Vec::new();
        push_segments(&mut segments, raw).ok_or_else(|| PathError::OutsideRoot {
            path: raw.to_string(),
        })?;
        Ok(Self(segments.join("/")))
    }

    /// The repository root directory.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Express a filesystem path below `root` as a [`DocPath`].
    ///
    /// # Errors
    ///
    /// Returns [`PathError::OutsideRoot`] if `path` is not below `root`, and
    /// [`PathError::NonUtf8`] if a component is not valid UTF-8.
    pub fn from_fs(root: &Path, path: &Path) -> Result<Self, PathError> {
        let rel = path
            .strip_prefix(root)
            .map_err(|_| PathError::OutsideRoot {
                path: path.display().to_string(),
            })?;
        let mut segments = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| PathError::NonUtf8 {
                        path: path.display().to_string(),
                    })?;
                    segments.push(part.to_string());
                }
                Component::CurDir => {}
                _ => {
                    return Err(PathError::OutsideRoot {
                        path: path.display().to_string(),
                    })
                }
            }
        }
        Ok(Self(segments.join("/")))
    }

    /// Resolve the path part of a link written inside this document.
    ///
    /// A leading `/` makes the link root-relative; otherwise it is relative
    /// to this document's directory.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::OutsideRoot`] if the link climbs above the root.
    pub fn join_link(&self, link_path: &str) -> Result<Self, PathError> {
        let mut segments: Vec<&str> = Vec::new();
        if !link_path.starts_with('/') {
            if let Some(dir) = self.0.rsplit_once('/').map(|(dir, _)| dir) {
                segments.extend(dir.split('/'));
            }
        }
        push_segments(&mut segments, link_path).ok_or_else(|| PathError::OutsideRoot {
            path: link_path.to_string(),
        })?;
        Ok(Self(segments.join("/")))
    }

    /// The directory containing this path. The root's parent is the root.
    pub fn parent(&self) -> Self {
        match self.0.rsplit_once('/') {
            Some((dir, _)) => Self(dir.to_string()),
            None => Self::root(),
        }
    }

    /// Append a single file name (used to map a directory to its `README.md`).
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Whether this is the root directory.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the final segment has a `.md` extension (case-insensitive).
    pub fn is_markdown(&self) -> bool {
        self.0
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("md"))
    }

    /// Borrow the normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The corresponding path on disk below `root`.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            out.push(segment);
        }
        out
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Apply the segments of `raw` onto `segments`. `None` if `..` underflows.
fn push_segments<'a>(segments: &mut Vec<&'a str>, raw: &'a str) -> Option<()> {
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(())
}
