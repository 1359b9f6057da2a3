#![deny(missing_docs)]

//! # specgraph-check: Cross-Document Validation
//!
//! Builds the global [`Registry`] from per-document extractions and runs
//! every cross-document check against it:
//!
//! - **Anchor uniqueness**: each explicit anchor id is declared once.
//! - **Footnotes**: every citation has a definition, every definition is
//!   cited, every target test exists ([`footnotes`]).
//! - **Coverage**: authority-bearing sections cite at least one existing
//!   test ([`coverage`]).
//! - **Authority conflicts**: sections on the same topic do not contradict
//!   each other ([`conflict`]).
//! - **Hyperlink integrity**: internal links reach existing files and
//!   anchors ([`links`]).
//! - **Catalog syntax** (opt-in): the tree uses anchors, authority levels,
//!   test references, and requirement keywords at all ([`syntax`]).
//!
//! The result is a deterministic [`Report`].
//!
//! ## Two Passes
//!
//! [`Registry::build`] (pass 1) must see every document before any check
//! runs (pass 2). [`Validator::check`] enforces that ordering by taking
//! ownership of the full extraction set.

pub mod conflict;
pub mod coverage;
pub mod disk;
pub mod error;
pub mod footnotes;
pub mod issue;
pub mod links;
pub mod options;
pub mod registry;
pub mod report;
pub mod syntax;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use specgraph_scan::{DocumentLoader, ExtractionPool, FileExtraction};

pub use conflict::{
    detect_conflicts, heuristic_for, AuthorityConflict, ConflictHeuristic, LevelGapHeuristic,
    ModalHeuristic, NoHeuristic,
};
pub use coverage::{CoverageSummary, SectionCoverage, UntestedSection};
pub use disk::Disk;
pub use error::{CheckError, OptionParseError};
pub use footnotes::FootnoteCheck;
pub use issue::{Issue, IssueKind, Severity};
pub use links::{BrokenLink, BrokenReason, LinkChecker};
pub use options::{CheckOptions, HeuristicKind, TopicKey};
pub use registry::{DuplicateAnchor, Location, Registry};
pub use report::{Report, ReportParts, Summary, EXIT_FATAL, EXIT_INVALID, EXIT_OK};

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Runs a full validation of one repository.
pub struct Validator {
    root: PathBuf,
    options: CheckOptions,
    heuristic: Box<dyn ConflictHeuristic>,
}

impl Validator {
    /// A validator for `root` using the heuristic named in `options`.
    pub fn new(root: impl Into<PathBuf>, options: CheckOptions) -> Self {
        let heuristic = heuristic_for(options.conflict_heuristic);
        Self {
            root: root.into(),
            options,
            heuristic,
        }
    }

    /// Replace the conflict heuristic with a caller-supplied one.
    pub fn with_heuristic(mut self, heuristic: Box<dyn ConflictHeuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Options in effect.
    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Load, extract, and check the whole repository.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Scan`] for fatal load failures, invalid
    /// exclude patterns, or when `cancel` is raised.
    pub fn run(&self, cancel: &AtomicBool) -> Result<Report, CheckError> {
        let loader = DocumentLoader::new(&self.root, &self.options.exclude)?;
        let pool = ExtractionPool::new(self.options.jobs);
        tracing::info!(root = %self.root.display(), workers = pool.workers(), "validating");

        let output = pool.run(&loader, cancel)?;
        let load_issues = output
            .failures
            .iter()
            .map(|failure| {
                let file = failure
                    .path()
                    .strip_prefix(&self.root)
                    .unwrap_or(failure.path())
                    .display()
                    .to_string();
                Issue::warning(IssueKind::LoadFailure, file, None, failure.to_string())
            })
            .collect();

        Ok(self.check(&loader, output.extractions, load_issues))
    }

    /// Pass 1 and pass 2 over already-extracted documents.
    pub fn check(
        &self,
        loader: &DocumentLoader,
        extractions: Vec<FileExtraction>,
        mut issues: Vec<Issue>,
    ) -> Report {
        let registry = Registry::build(extractions);
        let disk = Disk::new(loader.root());

        issues.extend(registry.parse_warnings().iter().map(Issue::from));

        let duplicate_anchors = registry.duplicate_anchors();
        for duplicate in &duplicate_anchors {
            for location in &duplicate.locations {
                let others: Vec<String> = duplicate
                    .locations
                    .iter()
                    .filter(|other| *other != location)
                    .map(ToString::to_string)
                    .collect();
                issues.push(Issue::error(
                    IssueKind::DuplicateAnchor,
                    location.doc_path.as_str(),
                    Some(location.line),
                    format!(
                        "duplicate anchor #{} (also declared at {})",
                        duplicate.anchor_id,
                        others.join(", ")
                    ),
                ));
            }
        }

        let footnotes = FootnoteCheck::run(&registry, &disk);
        issues.extend(footnotes.issues());

        let coverage = CoverageSummary::compute(&registry, &footnotes);
        issues.extend(coverage.issues(self.options.check_coverage));

        let conflicts = if self.options.authority_conflicts {
            detect_conflicts(&registry, self.options.topic_key, self.heuristic.as_ref())
        } else {
            Vec::new()
        };
        issues.extend(conflicts.iter().map(AuthorityConflict::to_issue));

        let broken_links = LinkChecker::new(
            &registry,
            &disk,
            loader,
            self.options.implicit_heading_anchors,
        )
        .check_all();
        issues.extend(broken_links.iter().map(BrokenLink::to_issue));

        if self.options.validate_syntax {
            issues.extend(syntax::catalog_syntax_issues(&registry));
        }

        let summary = Summary {
            documents: registry.document_count(),
            sections: registry.sections().len(),
            footnote_definitions: registry.footnote_defs().len(),
            footnote_references: registry.footnote_refs().len(),
            hyperlinks: registry.hyperlinks().len(),
            ..Summary::default()
        };

        let report = Report::assemble(
            ReportParts {
                coverage: Some(coverage),
                conflicts,
                broken_links,
                orphan_footnotes: footnotes.orphans,
                unused_footnotes: footnotes.unused,
                duplicate_anchors,
                issues,
                summary,
            },
            self.options.strict,
        );

        tracing::info!(
            errors = report.summary.errors,
            warnings = report.summary.warnings,
            coverage = report.coverage_percent,
            "validation finished"
        );
        report
    }
}
