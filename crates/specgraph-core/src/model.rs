//! # Extracted Records
//!
//! Plain data produced by the per-document extractors and consumed by the
//! registry. Line numbers are 1-based throughout.

use serde::{Deserialize, Serialize};

use crate::authority::Authority;
use crate::path::DocPath;

/// A heading carrying an explicit `{#id}` anchor tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredSection {
    /// The anchor id, exactly as written in the tag.
    pub anchor_id: String,
    /// Declared authority, [`Authority::None`] when absent.
    pub authority: Authority,
    /// Heading text with the anchor tag removed.
    pub title: String,
    /// Document declaring the anchor.
    pub doc_path: DocPath,
    /// Line of the heading.
    pub line: usize,
    /// Heading depth, 1 for `#` through 6 for `######`.
    pub level: u8,
    /// Last line of the section body, inclusive.
    pub body_end: usize,
    /// Slug of the nearest enclosing H1/H2, or of the section's own title.
    pub topic: String,
    /// Body lines that state a requirement (MUST, SHOULD, MAY).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
}

impl AnchoredSection {
    /// Whether `line` falls within this section (heading included).
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.line && line <= self.body_end
    }
}

/// A `[^id]: path/to/test` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteDefinition {
    /// Footnote id without the `[^` `]` markers.
    pub footnote_id: String,
    /// Everything after the colon, trimmed.
    pub target_path: String,
    /// Document declaring the footnote.
    pub doc_path: DocPath,
    /// Line of the definition.
    pub line: usize,
}

impl FootnoteDefinition {
    /// Split `target_path` into the file part and an optional `::test_name`.
    pub fn target_parts(&self) -> (&str, Option<&str>) {
        match self.target_path.split_once("::") {
            Some((file, name)) if !name.trim().is_empty() => (file.trim(), Some(name.trim())),
            Some((file, _)) => (file.trim(), None),
            None => (self.target_path.trim(), None),
        }
    }
}

/// An inline `[^id]` citation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FootnoteReference {
    /// Footnote id without the markers.
    pub footnote_id: String,
    /// Document containing the citation.
    pub doc_path: DocPath,
    /// Line of the citation.
    pub line: usize,
}

/// Where an internal link points, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum LinkTarget {
    /// `#slug` in the same document.
    SameFile,
    /// A file or directory inside the repository.
    Path(DocPath),
    /// A relative path that climbs above the repository root.
    OutsideRoot(String),
}

/// An internal markdown link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Document containing the link.
    pub source_doc: DocPath,
    /// Line of the link.
    pub source_line: usize,
    /// Resolved target document.
    pub target: LinkTarget,
    /// Fragment after `#`, if any.
    pub target_anchor: Option<String>,
    /// The destination exactly as written.
    pub raw_href: String,
}

impl Hyperlink {
    /// The target document, `None` for same-file links and escapes.
    pub fn target_doc(&self) -> Option<&DocPath> {
        match &self.target {
            LinkTarget::Path(p) => Some(p),
            LinkTarget::SameFile | LinkTarget::OutsideRoot(_) => None,
        }
    }

    /// Whether the link points into its own document.
    pub fn is_self_link(&self) -> bool {
        match &self.target {
            LinkTarget::SameFile => true,
            LinkTarget::Path(p) => *p == self.source_doc,
            LinkTarget::OutsideRoot(_) => false,
        }
    }
}

/// Category of a recoverable per-line syntax problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseWarningKind {
    /// `{#` with no closing `}` or an empty/invalid id.
    MalformedAnchor,
    /// `authority=` value not recognized.
    UnknownAuthority,
    /// Attribute other than `authority=` inside an anchor tag.
    UnknownAttribute,
    /// A line that starts like a footnote definition but is not one.
    MalformedFootnote,
    /// A code fence that is still open at end of file.
    UnterminatedFence,
}

/// A recoverable syntax problem found while scanning one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Document where the problem was found.
    pub doc_path: DocPath,
    /// Offending line.
    pub line: usize,
    /// Category.
    pub kind: ParseWarningKind,
    /// Human-readable description.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(target: &str) -> FootnoteDefinition {
        FootnoteDefinition {
            footnote_id: "t".to_string(),
            target_path: target.to_string(),
            doc_path: DocPath::new("spec.md").unwrap(),
            line: 1,
        }
    }

    #[test]
    fn target_parts_plain_file() {
        assert_eq!(def("tests/test_cli.py").target_parts(), ("tests/test_cli.py", None));
    }

    #[test]
    fn target_parts_with_test_name() {
        assert_eq!(
            def("tests/test_validation.py::test_arn_validation").target_parts(),
            ("tests/test_validation.py", Some("test_arn_validation"))
        );
    }

    #[test]
    fn target_parts_empty_test_name_is_ignored() {
        assert_eq!(def("tests/a.py::").target_parts(), ("tests/a.py", None));
    }

    #[test]
    fn contains_line_is_inclusive() {
        let section = AnchoredSection {
            anchor_id: "a".to_string(),
            authority: Authority::System,
            title: "A".to_string(),
            doc_path: DocPath::new("x.md").unwrap(),
            line: 3,
            level: 2,
            body_end: 7,
            topic: "a".to_string(),
            requirements: Vec::new(),
        };
        assert!(section.contains_line(3));
        assert!(section.contains_line(7));
        assert!(!section.contains_line(8));
        assert!(!section.contains_line(2));
    }

    #[test]
    fn self_link_detection() {
        let source = DocPath::new("README.md").unwrap();
        let mut link = Hyperlink {
            source_doc: source.clone(),
            source_line: 1,
            target: LinkTarget::SameFile,
            target_anchor: Some("x".to_string()),
            raw_href: "#x".to_string(),
        };
        assert!(link.is_self_link());
        link.target = LinkTarget::Path(source);
        assert!(link.is_self_link());
        link.target = LinkTarget::OutsideRoot("../x.md".to_string());
        assert!(!link.is_self_link());
        assert!(link.target_doc().is_none());
    }
}
