//! # Per-Document Extraction
//!
//! [`extract_document`] is the unit of work handed to pool workers. It is a
//! pure function of one [`Document`]: the text is parsed once and each
//! extractor reads the shared [`MarkdownScan`].

use serde::Serialize;

use specgraph_core::{
    AnchoredSection, DocPath, Document, FootnoteDefinition, FootnoteReference, Hyperlink,
    ParseWarning, ParseWarningKind,
};

use crate::anchor::{count_requirement_lines, extract_sections};
use crate::footnote::extract_footnotes;
use crate::hyperlink::extract_hyperlinks;
use crate::markdown::MarkdownScan;

/// Everything one document contributes to the registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileExtraction {
    /// Source document.
    pub doc_path: DocPath,
    /// Explicitly anchored headings.
    pub sections: Vec<AnchoredSection>,
    /// Footnote definitions.
    pub footnote_defs: Vec<FootnoteDefinition>,
    /// Footnote citations.
    pub footnote_refs: Vec<FootnoteReference>,
    /// Internal links.
    pub hyperlinks: Vec<Hyperlink>,
    /// Recoverable syntax problems.
    pub parse_warnings: Vec<ParseWarning>,
    /// GitHub-style slugs of every heading.
    pub implicit_slugs: Vec<String>,
    /// Prose lines stating a MUST, SHOULD, or MAY.
    pub requirement_lines: usize,
}

/// Run every extractor over `doc`.
pub fn extract_document(doc: &Document) -> FileExtraction {
    let markdown = MarkdownScan::new(doc);
    let lines = markdown.lines(doc);

    let anchors = extract_sections(doc, &markdown, &lines);
    let footnotes = extract_footnotes(doc, &lines);
    let hyperlinks = extract_hyperlinks(doc, &markdown);

    let mut parse_warnings = anchors.warnings;
    parse_warnings.extend(footnotes.warnings);
    if let Some(line) = markdown.unterminated_fence {
        parse_warnings.push(ParseWarning {
            doc_path: doc.path.clone(),
            line,
            kind: ParseWarningKind::UnterminatedFence,
            message: "code fence is never closed; the rest of the file is treated as code"
                .to_string(),
        });
    }
    parse_warnings.sort_by_key(|w| (w.line, w.kind));

    tracing::trace!(
        path = %doc.path,
        sections = anchors.sections.len(),
        footnote_defs = footnotes.definitions.len(),
        footnote_refs = footnotes.references.len(),
        hyperlinks = hyperlinks.len(),
        "extracted document"
    );

    FileExtraction {
        doc_path: doc.path.clone(),
        sections: anchors.sections,
        footnote_defs: footnotes.definitions,
        footnote_refs: footnotes.references,
        hyperlinks,
        parse_warnings,
        implicit_slugs: anchors.implicit_slugs,
        requirement_lines: count_requirement_lines(&lines),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_core::Authority;

    const SPEC: &str = "\
# Policy Generator

## CLI Requirements {#cli_requirements authority=system}

The tool MUST accept --policy-type [^test_cli_policy_type]

See [output](#output-format).

## Output Format

```text
[^not_a_ref]
```

[^test_cli_policy_type]: tests/test_cli.py
";

    #[test]
    fn extracts_all_record_kinds() {
        let doc = Document::new(DocPath::new("spec.md").unwrap(), SPEC.to_string());
        let ex = extract_document(&doc);
        assert_eq!(ex.doc_path.as_str(), "spec.md");
        assert_eq!(ex.sections.len(), 1);
        assert_eq!(ex.sections[0].authority, Authority::System);
        assert_eq!(ex.footnote_refs.len(), 1);
        assert_eq!(ex.footnote_defs.len(), 1);
        assert_eq!(ex.hyperlinks.len(), 1);
        assert_eq!(
            ex.implicit_slugs,
            vec!["policy-generator", "cli-requirements", "output-format"]
        );
        assert!(ex.parse_warnings.is_empty());
        assert_eq!(ex.requirement_lines, 1);
    }

    #[test]
    fn unterminated_fence_becomes_warning() {
        let doc = Document::new(
            DocPath::new("a.md").unwrap(),
            "# A\n```\n## hidden {#hidden}\n".to_string(),
        );
        let ex = extract_document(&doc);
        assert!(ex.sections.is_empty());
        assert_eq!(ex.parse_warnings.len(), 1);
        assert_eq!(ex.parse_warnings[0].kind, ParseWarningKind::UnterminatedFence);
        assert_eq!(ex.parse_warnings[0].line, 2);
    }

    #[test]
    fn extraction_is_deterministic() {
        let doc = Document::new(DocPath::new("spec.md").unwrap(), SPEC.to_string());
        let a = serde_json::to_string(&extract_document(&doc)).unwrap();
        let b = serde_json::to_string(&extract_document(&doc)).unwrap();
        assert_eq!(a, b);
    }
}
