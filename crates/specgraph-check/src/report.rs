//! # Validation Report
//!
//! The report is a pure value: every collection is sorted and nothing
//! depends on wall-clock time or worker scheduling, so an unchanged tree
//! always renders byte-identical output.
//!
//! Two renderings exist: a human-readable text report and pretty-printed
//! JSON with a fixed top-level key order.

use std::fmt::Write as _;

use serde::Serialize;

use specgraph_core::{FootnoteDefinition, FootnoteReference};

use crate::conflict::AuthorityConflict;
use crate::coverage::{CoverageSummary, SectionCoverage};
use crate::issue::{Issue, Severity};
use crate::links::BrokenLink;
use crate::registry::DuplicateAnchor;

/// Exit code when validation passed.
pub const EXIT_OK: u8 = 0;
/// Exit code when the catalog has errors.
pub const EXIT_INVALID: u8 = 1;
/// Exit code for usage or I/O failure before validation could run.
pub const EXIT_FATAL: u8 = 2;

/// Counts shown at the top of the text report and under `summary` in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Loaded documents.
    pub documents: usize,
    /// Anchored sections.
    pub sections: usize,
    /// Sections with authority other than `none`.
    pub authority_sections: usize,
    /// Authority sections with at least one linked test.
    pub covered_sections: usize,
    /// Footnote definitions.
    pub footnote_definitions: usize,
    /// Footnote citations.
    pub footnote_references: usize,
    /// Internal links checked.
    pub hyperlinks: usize,
    /// Error-class issues.
    pub errors: usize,
    /// Warning-class issues.
    pub warnings: usize,
    /// Warnings were promoted to errors.
    pub strict: bool,
}

/// The complete result of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Share of authority sections with a linked test.
    pub coverage_percent: f64,
    /// Per-section coverage.
    pub sections: Vec<SectionCoverage>,
    /// Authority conflicts (empty unless conflict detection ran).
    pub conflicts: Vec<AuthorityConflict>,
    /// Links that do not resolve.
    pub broken_links: Vec<BrokenLink>,
    /// Citations with no definition.
    pub orphan_footnotes: Vec<FootnoteReference>,
    /// Definitions never cited.
    pub unused_footnotes: Vec<FootnoteDefinition>,
    /// Anchor ids declared more than once.
    pub duplicate_anchors: Vec<DuplicateAnchor>,
    /// Warning-class issues.
    pub warnings: Vec<Issue>,
    /// Error-class issues.
    pub errors: Vec<Issue>,
    /// Totals.
    pub summary: Summary,
}

/// Inputs to [`Report::assemble`].
#[derive(Debug, Default)]
pub struct ReportParts {
    /// Coverage results.
    pub coverage: Option<CoverageSummary>,
    /// Conflicts found.
    pub conflicts: Vec<AuthorityConflict>,
    /// Broken links.
    pub broken_links: Vec<BrokenLink>,
    /// Orphan citations.
    pub orphan_footnotes: Vec<FootnoteReference>,
    /// Unused definitions.
    pub unused_footnotes: Vec<FootnoteDefinition>,
    /// Duplicate anchors.
    pub duplicate_anchors: Vec<DuplicateAnchor>,
    /// Every issue, any severity, any order.
    pub issues: Vec<Issue>,
    /// Totals (error and warning counts are filled in by `assemble`).
    pub summary: Summary,
}

impl Report {
    /// Sort everything, split issues by severity, and promote warnings when
    /// `strict`.
    pub fn assemble(parts: ReportParts, strict: bool) -> Self {
        let ReportParts {
            coverage,
            mut conflicts,
            mut broken_links,
            mut orphan_footnotes,
            mut unused_footnotes,
            mut duplicate_anchors,
            mut issues,
            mut summary,
        } = parts;

        if strict {
            for issue in &mut issues {
                issue.severity = Severity::Error;
            }
        }
        crate::issue::sort_issues(&mut issues);
        let (errors, warnings): (Vec<Issue>, Vec<Issue>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);

        conflicts.sort_by(|a, b| (&a.first, &a.second).cmp(&(&b.first, &b.second)));
        broken_links.sort_by(|a, b| {
            (&a.source_doc, a.source_line, &a.raw_href).cmp(&(&b.source_doc, b.source_line, &b.raw_href))
        });
        orphan_footnotes.sort_by(|a, b| (&a.doc_path, a.line).cmp(&(&b.doc_path, b.line)));
        unused_footnotes.sort_by(|a, b| (&a.doc_path, a.line).cmp(&(&b.doc_path, b.line)));
        duplicate_anchors.sort_by(|a, b| a.locations.cmp(&b.locations));

        let coverage = coverage.unwrap_or(CoverageSummary {
            sections: Vec::new(),
            covered: 0,
            total: 0,
            percent: 100.0,
            untested: Vec::new(),
        });
        let mut sections = coverage.sections;
        sections.sort_by(|a, b| (&a.doc_path, a.line).cmp(&(&b.doc_path, b.line)));

        summary.authority_sections = coverage.total;
        summary.covered_sections = coverage.covered;
        summary.errors = errors.len();
        summary.warnings = warnings.len();
        summary.strict = strict;

        Self {
            coverage_percent: coverage.percent,
            sections,
            conflicts,
            broken_links,
            orphan_footnotes,
            unused_footnotes,
            duplicate_anchors,
            warnings,
            errors,
            summary,
        }
    }

    /// Whether any error-class issue was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `0` when clean, `1` when any error (or, under strict, any warning).
    pub fn exit_code(&self) -> u8 {
        if self.has_errors() {
            EXIT_INVALID
        } else {
            EXIT_OK
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Only if serialization fails, which the report's types rule out.
    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        let _ = writeln!(out, "specgraph validation report");
        let _ = writeln!(out, "===========================");
        let _ = writeln!(
            out,
            "Documents: {}  Sections: {} ({} authority-bearing)  Footnotes: {} defined, {} cited  Links: {}",
            s.documents,
            s.sections,
            s.authority_sections,
            s.footnote_definitions,
            s.footnote_references,
            s.hyperlinks
        );
        let _ = writeln!(
            out,
            "Coverage: {:.1}% ({}/{} authority sections covered)",
            self.coverage_percent, s.covered_sections, s.authority_sections
        );

        if !self.sections.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Test coverage by section:");
            for section in &self.sections {
                let icon = if !section.covered {
                    "❌"
                } else if section.linked < section.referenced {
                    "⚠️"
                } else {
                    "✅"
                };
                let _ = writeln!(
                    out,
                    "{icon} {}: {:.0}% ({}/{} tests linked)",
                    section.anchor_id, section.percent, section.linked, section.referenced
                );
                for missing in &section.missing {
                    let _ = writeln!(
                        out,
                        "   ⚠️ Missing test: [^{}] in line {}",
                        missing.footnote_id, missing.line
                    );
                }
            }
        }

        if !self.conflicts.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Authority conflicts:");
            for conflict in &self.conflicts {
                let _ = writeln!(
                    out,
                    "  [{}] {} ({}, {}:{}) vs {} ({}, {}:{}): {}",
                    conflict.topic,
                    conflict.first.anchor_id,
                    conflict.first.authority,
                    conflict.first.doc_path,
                    conflict.first.line,
                    conflict.second.anchor_id,
                    conflict.second.authority,
                    conflict.second.doc_path,
                    conflict.second.line,
                    conflict.reason
                );
            }
        }

        let mut issues: Vec<&Issue> = self.errors.iter().chain(&self.warnings).collect();
        issues.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        if !issues.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Issues:");
            for issue in issues {
                let _ = writeln!(out, "{issue}");
            }
        }

        let _ = writeln!(out);
        let verdict = if self.has_errors() { "FAILED" } else { "PASSED" };
        let _ = writeln!(
            out,
            "Result: {verdict} ({} error{}, {} warning{}){}",
            s.errors,
            plural(s.errors),
            s.warnings,
            plural(s.warnings),
            if s.strict { " [strict]" } else { "" }
        );
        out
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::MissingTest;
    use crate::issue::IssueKind;
    use specgraph_core::{Authority, DocPath};

    fn section(id: &str, linked: usize, referenced: usize, missing: Vec<MissingTest>) -> SectionCoverage {
        SectionCoverage {
            anchor_id: id.to_string(),
            doc_path: DocPath::new("spec.md").unwrap(),
            line: 1,
            authority: Authority::System,
            referenced,
            linked,
            percent: if referenced == 0 { 0.0 } else { linked as f64 / referenced as f64 * 100.0 },
            covered: linked > 0,
            missing,
        }
    }

    fn parts(issues: Vec<Issue>) -> ReportParts {
        ReportParts {
            coverage: Some(CoverageSummary {
                sections: vec![
                    section("cli_requirements", 3, 3, Vec::new()),
                    section(
                        "security_sandbox",
                        0,
                        1,
                        vec![MissingTest {
                            footnote_id: "test_sandbox".to_string(),
                            line: 12,
                        }],
                    ),
                ],
                covered: 1,
                total: 2,
                percent: 50.0,
                untested: Vec::new(),
            }),
            issues,
            summary: Summary {
                documents: 1,
                sections: 2,
                ..Summary::default()
            },
            ..ReportParts::default()
        }
    }

    #[test]
    fn warnings_only_exit_zero() {
        let report = Report::assemble(
            parts(vec![Issue::warning(IssueKind::UnusedFootnote, "spec.md", Some(3), "unused")]),
            false,
        );
        assert_eq!(report.exit_code(), EXIT_OK);
        assert_eq!(report.summary.warnings, 1);
    }

    #[test]
    fn strict_promotes_warnings() {
        let report = Report::assemble(
            parts(vec![Issue::warning(IssueKind::UnusedFootnote, "spec.md", Some(3), "unused")]),
            true,
        );
        assert_eq!(report.exit_code(), EXIT_INVALID);
        assert!(report.warnings.is_empty());
        assert_eq!(report.errors[0].severity, Severity::Error);
    }

    #[test]
    fn text_report_lists_sections_and_missing_tests() {
        let report = Report::assemble(parts(Vec::new()), false);
        let text = report.render_text();
        assert!(text.contains("✅ cli_requirements: 100% (3/3 tests linked)"));
        assert!(text.contains("❌ security_sandbox: 0% (0/1 tests linked)"));
        assert!(text.contains("   ⚠️ Missing test: [^test_sandbox] in line 12"));
        assert!(text.contains("Coverage: 50.0% (1/2 authority sections covered)"));
        assert!(text.ends_with("Result: PASSED (0 errors, 0 warnings)\n"));
    }

    #[test]
    fn json_report_has_stable_top_level_keys() {
        let report = Report::assemble(parts(Vec::new()), false);
        let json = report.render_json().unwrap();
        let keys = [
            "\"coverage_percent\"",
            "\"sections\"",
            "\"conflicts\"",
            "\"broken_links\"",
            "\"orphan_footnotes\"",
            "\"unused_footnotes\"",
            "\"duplicate_anchors\"",
            "\"warnings\"",
            "\"errors\"",
            "\"summary\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn issues_are_sorted_in_text() {
        let report = Report::assemble(
            parts(vec![
                Issue::error(IssueKind::BrokenLink, "b.md", Some(1), "second"),
                Issue::warning(IssueKind::UnusedFootnote, "a.md", Some(5), "first"),
            ]),
            false,
        );
        let text = report.render_text();
        let first = text.find("first").unwrap();
        let second = text.find("second").unwrap();
        assert!(first < second);
        assert!(text.contains("Result: FAILED (1 error, 1 warning)"));
    }
}
