//! # Error Hierarchy
//!
//! Structured error types for the validator, built with `thiserror`.
//!
//! Only conditions that stop a run live here. Findings about the catalog
//! itself (broken links, duplicate anchors, malformed tags) are not errors in
//! the Rust sense: they are collected as issues and reported.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while enumerating or reading documents.
///
/// [`LoadError::RootNotFound`] and [`LoadError::RootUnreadable`] are fatal.
/// Per-file variants are reported and the file is skipped.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The requested root directory does not exist.
    #[error("root directory not found: {}", path.display())]
    RootNotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// The requested root exists but cannot be listed.
    #[error("root directory unreadable: {}: {source}", path.display())]
    RootUnreadable {
        /// The path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A single file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    FileUnreadable {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// A file was read but is not valid UTF-8.
    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 {
        /// The offending file.
        path: PathBuf,
    },

    /// A directory below the root could not be traversed.
    #[error("failed to traverse {}: {reason}", path.display())]
    Traversal {
        /// Directory (or entry) that failed.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// The root contained no readable markdown files.
    #[error("no readable markdown files under {}", path.display())]
    NoDocuments {
        /// The root that was scanned.
        path: PathBuf,
    },
}

impl LoadError {
    /// Whether this error prevents validation from running at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RootNotFound { .. } | Self::RootUnreadable { .. } | Self::NoDocuments { .. }
        )
    }

    /// The filesystem path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::RootNotFound { path }
            | Self::RootUnreadable { path, .. }
            | Self::FileUnreadable { path, .. }
            | Self::NotUtf8 { path }
            | Self::Traversal { path, .. }
            | Self::NoDocuments { path } => path,
        }
    }
}

/// Errors constructing a [`DocPath`](crate::DocPath).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path is not below the repository root.
    #[error("path {path:?} is outside the repository root")]
    OutsideRoot {
        /// The offending path, as given.
        path: String,
    },

    /// The path contains a component that cannot be represented as UTF-8.
    #[error("path {path:?} is not valid UTF-8")]
    NonUtf8 {
        /// Lossy rendering of the offending path.
        path: String,
    },
}

/// An `authority=` value that is not one of the known levels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown authority level {value:?} (expected system, platform, or feature)")]
pub struct AuthorityParseError {
    /// The rejected value.
    pub value: String,
}
