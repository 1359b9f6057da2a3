//! # Issues
//!
//! Every finding the validator reports is an [`Issue`]: a kind, a severity,
//! a location, and a message. Typed findings (broken links, conflicts, …)
//! are also reported in their own report sections; the issue list is the
//! flat, sorted view used for exit codes and the text report.

use std::fmt;

use serde::Serialize;

use specgraph_core::{ParseWarning, ParseWarningKind};

/// How a finding affects the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, exit 0 unless strict.
    Warning,
    /// Fails validation.
    Error,
}

impl Severity {
    /// Label used in the text report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Anchor id declared more than once.
    DuplicateAnchor,
    /// `[^id]` with no matching definition.
    OrphanFootnote,
    /// Link to a missing file, missing anchor, or outside the root.
    BrokenLink,
    /// Two authority-bearing sections contradict each other.
    AuthorityConflict,
    /// Footnote target file or named test does not exist.
    MissingTestTarget,
    /// Authority-bearing section with no linked test.
    UncoveredSection,
    /// `authority=none` section that cites no test.
    UntestedSection,
    /// Catalog-wide absence of a required syntax element.
    CatalogSyntax,
    /// Footnote definition never referenced.
    UnusedFootnote,
    /// Footnote id defined more than once.
    DuplicateFootnote,
    /// Anchor tag could not be parsed.
    MalformedAnchor,
    /// `authority=` value not recognized.
    UnknownAuthority,
    /// Unexpected attribute inside an anchor tag.
    UnknownAttribute,
    /// Line resembling a footnote definition that is not one.
    MalformedFootnote,
    /// Code fence left open at end of file.
    UnterminatedFence,
    /// A file or directory could not be read.
    LoadFailure,
}

impl IssueKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateAnchor => "duplicate_anchor",
            Self::OrphanFootnote => "orphan_footnote",
            Self::BrokenLink => "broken_link",
            Self::AuthorityConflict => "authority_conflict",
            Self::MissingTestTarget => "missing_test_target",
            Self::UncoveredSection => "uncovered_section",
            Self::UntestedSection => "untested_section",
            Self::CatalogSyntax => "catalog_syntax",
            Self::UnusedFootnote => "unused_footnote",
            Self::DuplicateFootnote => "duplicate_footnote",
            Self::MalformedAnchor => "malformed_anchor",
            Self::UnknownAuthority => "unknown_authority",
            Self::UnknownAttribute => "unknown_attribute",
            Self::MalformedFootnote => "malformed_footnote",
            Self::UnterminatedFence => "unterminated_fence",
            Self::LoadFailure => "load_failure",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ParseWarningKind> for IssueKind {
    fn from(kind: ParseWarningKind) -> Self {
        match kind {
            ParseWarningKind::MalformedAnchor => Self::MalformedAnchor,
            ParseWarningKind::UnknownAuthority => Self::UnknownAuthority,
            ParseWarningKind::UnknownAttribute => Self::UnknownAttribute,
            ParseWarningKind::MalformedFootnote => Self::MalformedFootnote,
            ParseWarningKind::UnterminatedFence => Self::UnterminatedFence,
        }
    }
}

/// One reported finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Category.
    pub kind: IssueKind,
    /// Error or warning.
    pub severity: Severity,
    /// Repository-relative file (or the root-relative path that failed to load).
    pub file: String,
    /// 1-based line, absent for whole-file findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    /// An error at `file:line`.
    pub fn error(kind: IssueKind, file: impl Into<String>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// A warning at `file:line`.
    pub fn warning(kind: IssueKind, file: impl Into<String>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// `file:line`, or just `file` when there is no line.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file, line),
            None => self.file.clone(),
        }
    }

    /// Report ordering: file, then line, then kind, then message.
    pub fn sort_key(&self) -> (&str, usize, IssueKind, &str) {
        (&self.file, self.line.unwrap_or(0), self.kind, &self.message)
    }
}

impl From<&ParseWarning> for Issue {
    fn from(warning: &ParseWarning) -> Self {
        Self::warning(
            warning.kind.into(),
            warning.doc_path.as_str(),
            Some(warning.line),
            warning.message.clone(),
        )
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: [{}] {}",
            self.severity.label(),
            self.location(),
            self.kind,
            self.message
        )
    }
}

/// Sort issues into report order and drop exact duplicates.
pub fn sort_issues(issues: &mut Vec<Issue>) {
    issues.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    issues.dedup();
}
