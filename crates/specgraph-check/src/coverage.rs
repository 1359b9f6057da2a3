//! # Test Coverage
//!
//! An authority-bearing section is covered when at least one footnote cited
//! inside its body resolves to a test that exists. Nested sections count
//! toward their parents, because a parent's body contains its children.
//!
//! Aggregate coverage is `covered / authority sections`, and `100.0` for a
//! catalog with no authority-bearing sections.
//!
//! Sections declared `authority=none` stay out of that ratio. One that cites
//! no test at all is still reported, as a warning.

use std::collections::BTreeSet;

use serde::Serialize;

use specgraph_core::{Authority, DocPath};

use crate::footnotes::FootnoteCheck;
use crate::issue::{Issue, IssueKind};
use crate::registry::Registry;

/// A cited footnote that does not lead to an existing test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTest {
    /// The footnote id.
    pub footnote_id: String,
    /// Line of the citation.
    pub line: usize,
}

/// Coverage of one authority-bearing section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionCoverage {
    /// Anchor id.
    pub anchor_id: String,
    /// Declaring document.
    pub doc_path: DocPath,
    /// Heading line.
    pub line: usize,
    /// Declared authority.
    pub authority: Authority,
    /// Distinct footnote ids cited in the body.
    pub referenced: usize,
    /// Distinct cited ids that resolve to an existing test.
    pub linked: usize,
    /// Share of cited ids that are linked, 0–100.
    pub percent: f64,
    /// At least one linked test.
    pub covered: bool,
    /// Citations that do not resolve to a test, in line order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<MissingTest>,
}

/// An `authority=none` section whose body cites no test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UntestedSection {
    /// Anchor id.
    pub anchor_id: String,
    /// Declaring document.
    pub doc_path: DocPath,
    /// Heading line.
    pub line: usize,
}

/// Coverage across the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    /// Per-section results, in path then line order.
    pub sections: Vec<SectionCoverage>,
    /// Authority-bearing sections with at least one linked test.
    pub covered: usize,
    /// Authority-bearing sections.
    pub total: usize,
    /// `covered / total * 100`, or `100.0` when `total` is zero.
    pub percent: f64,
    /// Non-binding sections without a single citation, in path then line order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub untested: Vec<UntestedSection>,
}

impl CoverageSummary {
    /// Compute coverage for every authority-bearing section.
    pub fn compute(registry: &Registry, footnotes: &FootnoteCheck) -> Self {
        let sections: Vec<SectionCoverage> = registry
            .authority_sections()
            .map(|section| {
                let mut referenced = BTreeSet::new();
                let mut linked = BTreeSet::new();
                let mut missing = Vec::new();

                for reference in registry
                    .footnote_refs()
                    .iter()
                    .filter(|r| r.doc_path == section.doc_path && section.contains_line(r.line))
                {
                    referenced.insert(reference.footnote_id.as_str());
                    if footnotes.is_linked(registry, reference) {
                        linked.insert(reference.footnote_id.as_str());
                    } else {
                        missing.push(MissingTest {
                            footnote_id: reference.footnote_id.clone(),
                            line: reference.line,
                        });
                    }
                }

                SectionCoverage {
                    anchor_id: section.anchor_id.clone(),
                    doc_path: section.doc_path.clone(),
                    line: section.line,
                    authority: section.authority,
                    referenced: referenced.len(),
                    linked: linked.len(),
                    percent: ratio(linked.len(), referenced.len(), 0.0),
                    covered: !linked.is_empty(),
                    missing,
                }
            })
            .collect();

        let untested = registry
            .sections()
            .iter()
            .filter(|section| !section.authority.is_binding())
            .filter(|section| {
                !registry
                    .footnote_refs()
                    .iter()
                    .any(|r| r.doc_path == section.doc_path && section.contains_line(r.line))
            })
            .map(|section| UntestedSection {
                anchor_id: section.anchor_id.clone(),
                doc_path: section.doc_path.clone(),
                line: section.line,
            })
            .collect();

        let total = sections.len();
        let covered = sections.iter().filter(|s| s.covered).count();
        Self {
            percent: ratio(covered, total, 100.0),
            sections,
            covered,
            total,
            untested,
        }
    }

    /// One issue per uncovered section, an error when coverage is enforced,
    /// plus a warning per untested `authority=none` section.
    pub fn issues(&self, enforce: bool) -> Vec<Issue> {
        let uncovered = self.sections.iter().filter(|s| !s.covered).map(|s| {
            let message = format!(
                "authority section {} ({}) has no linked test",
                s.anchor_id, s.authority
            );
            if enforce {
                Issue::error(IssueKind::UncoveredSection, s.doc_path.as_str(), Some(s.line), message)
            } else {
                Issue::warning(IssueKind::UncoveredSection, s.doc_path.as_str(), Some(s.line), message)
            }
        });
        let untested = self.untested.iter().map(|s| {
            Issue::warning(
                IssueKind::UntestedSection,
                s.doc_path.as_str(),
                Some(s.line),
                format!("section {} (authority=none) has no test link", s.anchor_id),
            )
        });
        uncovered.chain(untested).collect()
    }
}

fn ratio(part: usize, whole: usize, empty: f64) -> f64 {
    if whole == 0 {
        empty
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::Disk;
    use crate::issue::Severity;
    use specgraph_core::Document;
    use specgraph_scan::extract_document;
    use std::fs;

    fn summary(dir: &std::path::Path, text: &str) -> CoverageSummary {
        let registry = Registry::build(vec![extract_document(&Document::new(
            DocPath::new("spec.md").unwrap(),
            text.to_string(),
        ))]);
        let footnotes = FootnoteCheck::run(&registry, &Disk::new(dir));
        CoverageSummary::compute(&registry, &footnotes)
    }

    fn repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tests")).unwrap();
        fs::write(dir.path().join("tests/test_cli.py"), "def test_a(): pass\n").unwrap();
        dir
    }

    #[test]
    fn fully_covered_section() {
        let dir = repo();
        let s = summary(
            dir.path(),
            "## CLI {#cli_requirements authority=system}\nMUST x [^a]\nMUST y [^b]\n\n[^a]: tests/test_cli.py\n[^b]: tests/test_cli.py\n",
        );
        assert_eq!(s.total, 1);
        assert_eq!(s.covered, 1);
        assert_eq!(s.percent, 100.0);
        assert_eq!(s.sections[0].referenced, 2);
        assert_eq!(s.sections[0].linked, 2);
        assert!(s.sections[0].missing.is_empty());
    }

    #[test]
    fn partially_linked_section_is_covered() {
        let dir = repo();
        let s = summary(
            dir.path(),
            "## CLI {#cli authority=platform}\nMUST x [^a]\nMUST y [^gone]\n\n[^a]: tests/test_cli.py\n[^gone]: tests/gone.py\n",
        );
        assert!(s.sections[0].covered);
        assert_eq!(s.sections[0].percent, 50.0);
        assert_eq!(s.sections[0].missing, vec![MissingTest { footnote_id: "gone".to_string(), line: 3 }]);
    }

    #[test]
    fn uncovered_section_severity_depends_on_enforcement() {
        let dir = repo();
        let s = summary(
            dir.path(),
            "## A {#a authority=system}\nMUST a\n## B {#b authority=feature}\nMUST b [^t]\n[^t]: tests/test_cli.py\n",
        );
        assert_eq!(s.total, 2);
        assert_eq!(s.covered, 1);
        assert_eq!(s.percent, 50.0);
        assert_eq!(s.issues(false)[0].severity, Severity::Warning);
        assert_eq!(s.issues(true)[0].severity, Severity::Error);
        assert_eq!(s.issues(true)[0].line, Some(1));
    }

    #[test]
    fn no_authority_sections_is_full_coverage() {
        let dir = repo();
        let s = summary(dir.path(), "## Overview {#overview}\ntext [^t]\n[^t]: tests/test_cli.py\n");
        assert_eq!(s.total, 0);
        assert_eq!(s.percent, 100.0);
        assert!(s.untested.is_empty());
        assert!(s.issues(true).is_empty());
    }

    #[test]
    fn untested_none_section_warns_outside_the_ratio() {
        let dir = repo();
        let s = summary(
            dir.path(),
            "## Overview {#overview}\ntext\n## CLI {#cli authority=system}\nMUST x [^a]\n[^a]: tests/test_cli.py\n",
        );
        assert_eq!((s.covered, s.total), (1, 1));
        assert_eq!(s.percent, 100.0);
        assert_eq!(
            s.untested,
            vec![UntestedSection {
                anchor_id: "overview".to_string(),
                doc_path: DocPath::new("spec.md").unwrap(),
                line: 1,
            }]
        );
        let issues = s.issues(true);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UntestedSection);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].line, Some(1));
    }

    #[test]
    fn child_citations_cover_parent() {
        let dir = repo();
        let s = summary(
            dir.path(),
            "## Parent {#parent authority=system}\n### Child {#child authority=feature}\nMUST [^t]\n[^t]: tests/test_cli.py\n",
        );
        assert!(s.sections.iter().all(|sec| sec.covered));
    }
}
