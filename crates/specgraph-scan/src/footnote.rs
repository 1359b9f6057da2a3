//! # Footnote Extraction
//!
//! Test traceability rides on markdown footnotes. A requirement cites a test
//! with an inline reference, and a definition line elsewhere names the test
//! file:
//!
//! ```text
//! The CLI MUST accept --policy-type [^test_cli_policy_type]
//!
//! [^test_cli_policy_type]: tests/test_cli.py::test_policy_type
//! ```
//!
//! References on a definition line are not counted, so a definition never
//! satisfies itself.

use std::sync::LazyLock;

use regex::Regex;

use specgraph_core::{Document, FootnoteDefinition, FootnoteReference, ParseWarning, ParseWarningKind};

use crate::markdown::ScannedLine;

static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\^([\w-]+)\]:[ \t]*(.*?)[ \t]*$").expect("static footnote definition regex")
});

static DEFINITION_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\^[^\]]*\]:").expect("static footnote prefix regex"));

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^([\w-]+)\]").expect("static footnote reference regex"));

/// Footnotes found in one document.
#[derive(Debug, Default)]
pub struct FootnoteScan {
    /// `[^id]: target` lines.
    pub definitions: Vec<FootnoteDefinition>,
    /// Inline `[^id]` citations.
    pub references: Vec<FootnoteReference>,
    /// Lines that start like a definition but are not one.
    pub warnings: Vec<ParseWarning>,
}

/// Extract footnote definitions and references from `doc`.
pub fn extract_footnotes(doc: &Document, lines: &[ScannedLine<'_>]) -> FootnoteScan {
    let mut scan = FootnoteScan::default();

    for line in lines.iter().filter(|l| !l.in_code) {
        let candidate = line.text.trim_start();

        if let Some(caps) = DEFINITION.captures(candidate) {
            let target = caps.get(2).map_or("", |m| m.as_str());
            if target.is_empty() {
                scan.warnings.push(warning(
                    doc,
                    line.number,
                    format!("footnote definition [^{}] has no target", &caps[1]),
                ));
            } else {
                scan.definitions.push(FootnoteDefinition {
                    footnote_id: caps[1].to_string(),
                    target_path: target.to_string(),
                    doc_path: doc.path.clone(),
                    line: line.number,
                });
            }
            continue;
        }

        if DEFINITION_LIKE.is_match(candidate) {
            scan.warnings.push(warning(
                doc,
                line.number,
                "malformed footnote definition: id must contain only letters, digits, '_' or '-'"
                    .to_string(),
            ));
            continue;
        }

        for caps in REFERENCE.captures_iter(line.prose) {
            scan.references.push(FootnoteReference {
                footnote_id: caps[1].to_string(),
                doc_path: doc.path.clone(),
                line: line.number,
            });
        }
    }

    scan
}

fn warning(doc: &Document, line: usize, message: String) -> ParseWarning {
    ParseWarning {
        doc_path: doc.path.clone(),
        line,
        kind: ParseWarningKind::MalformedFootnote,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownScan;
    use specgraph_core::DocPath;

    fn scan(text: &str) -> FootnoteScan {
        let doc = Document::new(DocPath::new("docs/spec.md").unwrap(), text.to_string());
        let markdown = MarkdownScan::new(&doc);
        extract_footnotes(&doc, &markdown.lines(&doc))
    }

    #[test]
    fn definition_and_reference() {
        let s = scan("Tool MUST parse [^test_cli]\n\n[^test_cli]: tests/test_cli.py\n");
        assert_eq!(s.references.len(), 1);
        assert_eq!(s.references[0].footnote_id, "test_cli");
        assert_eq!(s.references[0].line, 1);
        assert_eq!(s.definitions.len(), 1);
        assert_eq!(s.definitions[0].target_path, "tests/test_cli.py");
        assert_eq!(s.definitions[0].line, 3);
        assert!(s.warnings.is_empty());
    }

    #[test]
    fn several_references_on_one_line() {
        let s = scan("Covered by [^a] and [^b-2].\n");
        let ids: Vec<_> = s.references.iter().map(|r| r.footnote_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b-2"]);
    }

    #[test]
    fn definition_line_is_not_a_reference() {
        let s = scan("[^x]: tests/x.py\n");
        assert!(s.references.is_empty());
    }

    #[test]
    fn code_is_ignored() {
        let s = scan("```\n[^fake]: nowhere\n[^fake]\n```\nuse `[^inline]` syntax\n");
        assert!(s.definitions.is_empty());
        assert!(s.references.is_empty());
    }

    #[test]
    fn definition_with_test_name() {
        let s = scan("[^t]: tests/test_validation.py::test_arn_validation\n");
        assert_eq!(
            s.definitions[0].target_parts(),
            ("tests/test_validation.py", Some("test_arn_validation"))
        );
    }

    #[test]
    fn malformed_definition_warns() {
        let s = scan("[^bad id]: tests/x.py\n");
        assert!(s.definitions.is_empty());
        assert_eq!(s.warnings.len(), 1);
        assert_eq!(s.warnings[0].kind, ParseWarningKind::MalformedFootnote);
    }

    #[test]
    fn empty_target_warns() {
        let s = scan("[^empty]:   \n");
        assert!(s.definitions.is_empty());
        assert_eq!(s.warnings.len(), 1);
    }

    #[test]
    fn indented_definition_is_accepted() {
        let s = scan("  [^t]: tests/t.py\n");
        assert_eq!(s.definitions.len(), 1);
    }

    #[test]
    fn indented_code_and_html_comments_are_ignored() {
        let s = scan("Intro.\n\n    [^sample]: tests/sample.py\n\n<!-- [^draft] -->\n");
        assert!(s.definitions.is_empty());
        assert!(s.references.is_empty());
    }
}
