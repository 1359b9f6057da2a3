//! Shared fixtures for the integration tests: a throwaway repository on
//! disk and a one-call validation helper.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use specgraph_check::{CheckOptions, Report, Validator};

/// A temporary repository populated file by file.
pub struct Catalog {
    dir: tempfile::TempDir,
}

impl Catalog {
    /// An empty repository.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Write `content` to the repository-relative `path`, creating parents.
    pub fn file(self, path: &str, content: &str) -> Self {
        self.write(path, content);
        self
    }

    /// Write in place.
    pub fn write(&self, path: &str, content: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(full, content).expect("write fixture file");
    }

    /// Repository root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Validate with `options`; panics on fatal errors.
    pub fn validate(&self, options: CheckOptions) -> Report {
        Validator::new(self.root(), options)
            .run(&AtomicBool::new(false))
            .expect("validation runs")
    }
}

/// Options with every opt-in check enabled and a fixed worker count.
pub fn all_checks() -> CheckOptions {
    CheckOptions {
        check_coverage: true,
        authority_conflicts: true,
        jobs: 4,
        ..CheckOptions::default()
    }
}

/// Default options with a fixed worker count.
pub fn defaults() -> CheckOptions {
    CheckOptions {
        jobs: 4,
        ..CheckOptions::default()
    }
}
