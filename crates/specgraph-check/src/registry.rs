//! # Registry
//!
//! The global index of every anchor, footnote, and link in the repository.
//!
//! Building is strictly two-pass:
//!
//! 1. [`Registry::build`] consumes every [`FileExtraction`] and fills the
//!    arena and indices. Input order does not matter; extractions are sorted
//!    by path first so every index is filled deterministically.
//! 2. Resolution (coverage, links, footnotes, conflicts) only ever receives
//!    a finished `&Registry`, so a lookup can never observe a half-built
//!    index.
//!
//! Sections live in a flat arena (`Vec<AnchoredSection>`); indices hold
//! arena positions, never references.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use specgraph_core::{
    AnchoredSection, DocPath, FootnoteDefinition, FootnoteReference, Hyperlink, ParseWarning,
};
use specgraph_scan::FileExtraction;

/// An anchor id declared at more than one location.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DuplicateAnchor {
    /// The repeated id.
    pub anchor_id: String,
    /// Every declaration, in path then line order.
    pub locations: Vec<Location>,
}

/// A `file:line` position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct Location {
    /// Repository-relative document.
    pub doc_path: DocPath,
    /// 1-based line.
    pub line: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.doc_path, self.line)
    }
}

/// Global anchor, footnote, and link index.
#[derive(Debug, Default)]
pub struct Registry {
    sections: Vec<AnchoredSection>,
    by_id: HashMap<String, Vec<usize>>,
    by_doc: BTreeMap<DocPath, Vec<usize>>,
    footnote_defs: Vec<FootnoteDefinition>,
    defs_by_id: HashMap<String, Vec<usize>>,
    footnote_refs: Vec<FootnoteReference>,
    hyperlinks: Vec<Hyperlink>,
    implicit_slugs: HashMap<DocPath, HashSet<String>>,
    documents: BTreeSet<DocPath>,
    parse_warnings: Vec<ParseWarning>,
    requirement_lines: usize,
}

impl Registry {
    /// Pass 1: merge every extraction into the arena and indices.
    pub fn build(mut extractions: Vec<FileExtraction>) -> Self {
        extractions.sort_by(|a, b| a.doc_path.cmp(&b.doc_path));
        let mut registry = Self::default();

        for extraction in extractions {
            registry.documents.insert(extraction.doc_path.clone());
            registry
                .implicit_slugs
                .entry(extraction.doc_path.clone())
                .or_default()
                .extend(extraction.implicit_slugs);

            for section in extraction.sections {
                let idx = registry.sections.len();
                registry
                    .by_id
                    .entry(section.anchor_id.clone())
                    .or_default()
                    .push(idx);
                registry
                    .by_doc
                    .entry(section.doc_path.clone())
                    .or_default()
                    .push(idx);
                registry.sections.push(section);
            }

            for def in extraction.footnote_defs {
                let idx = registry.footnote_defs.len();
                registry
                    .defs_by_id
                    .entry(def.footnote_id.clone())
                    .or_default()
                    .push(idx);
                registry.footnote_defs.push(def);
            }

            registry.footnote_refs.extend(extraction.footnote_refs);
            registry.hyperlinks.extend(extraction.hyperlinks);
            registry.parse_warnings.extend(extraction.parse_warnings);
            registry.requirement_lines += extraction.requirement_lines;
        }

        tracing::debug!(
            documents = registry.documents.len(),
            sections = registry.sections.len(),
            footnote_defs = registry.footnote_defs.len(),
            footnote_refs = registry.footnote_refs.len(),
            hyperlinks = registry.hyperlinks.len(),
            "registry built"
        );
        registry
    }

    /// Every anchored section, in path then line order.
    pub fn sections(&self) -> &[AnchoredSection] {
        &self.sections
    }

    /// Sections with authority other than `none`.
    pub fn authority_sections(&self) -> impl Iterator<Item = &AnchoredSection> {
        self.sections.iter().filter(|s| s.authority.is_binding())
    }

    /// Sections declared with `anchor_id`, anywhere.
    pub fn sections_with_id(&self, anchor_id: &str) -> impl Iterator<Item = &AnchoredSection> {
        self.by_id
            .get(anchor_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.sections[idx])
    }

    /// Sections declared in `doc`.
    pub fn sections_in(&self, doc: &DocPath) -> impl Iterator<Item = &AnchoredSection> {
        self.by_doc
            .get(doc)
            .into_iter()
            .flatten()
            .map(|&idx| &self.sections[idx])
    }

    /// Whether `anchor` resolves inside `doc`: an explicit anchor declared
    /// there, or (when enabled) one of its heading slugs.
    pub fn has_anchor(&self, doc: &DocPath, anchor: &str, implicit: bool) -> bool {
        self.sections_with_id(anchor).any(|s| s.doc_path == *doc)
            || (implicit
                && self
                    .implicit_slugs
                    .get(doc)
                    .is_some_and(|slugs| slugs.contains(anchor)))
    }

    /// Anchor ids declared at more than one location.
    pub fn duplicate_anchors(&self) -> Vec<DuplicateAnchor> {
        let mut duplicates: Vec<DuplicateAnchor> = self
            .by_id
            .iter()
            .filter(|(_, indices)| indices.len() > 1)
            .map(|(id, indices)| {
                let mut locations: Vec<Location> = indices
                    .iter()
                    .map(|&idx| Location {
                        doc_path: self.sections[idx].doc_path.clone(),
                        line: self.sections[idx].line,
                    })
                    .collect();
                locations.sort();
                DuplicateAnchor {
                    anchor_id: id.clone(),
                    locations,
                }
            })
            .collect();
        duplicates.sort_by(|a, b| a.locations.cmp(&b.locations));
        duplicates
    }

    /// Every footnote definition, in path then line order.
    pub fn footnote_defs(&self) -> &[FootnoteDefinition] {
        &self.footnote_defs
    }

    /// Definitions sharing `footnote_id`.
    pub fn definitions_of(&self, footnote_id: &str) -> impl Iterator<Item = &FootnoteDefinition> {
        self.defs_by_id
            .get(footnote_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.footnote_defs[idx])
    }

    /// The definition a reference binds to: one in the same document if
    /// present, otherwise the first in path order.
    pub fn resolve_reference(&self, reference: &FootnoteReference) -> Option<&FootnoteDefinition> {
        let mut candidates = self.definitions_of(&reference.footnote_id).peekable();
        let first = *candidates.peek()?;
        Some(
            candidates
                .find(|d| d.doc_path == reference.doc_path)
                .unwrap_or(first),
        )
    }

    /// Every footnote citation, in path then line order.
    pub fn footnote_refs(&self) -> &[FootnoteReference] {
        &self.footnote_refs
    }

    /// Every internal link, in path then line order.
    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// Whether `doc` was loaded.
    pub fn contains_document(&self, doc: &DocPath) -> bool {
        self.documents.contains(doc)
    }

    /// Loaded documents, sorted.
    pub fn documents(&self) -> impl Iterator<Item = &DocPath> {
        self.documents.iter()
    }

    /// Number of loaded documents.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Per-line syntax warnings from every document.
    pub fn parse_warnings(&self) -> &[ParseWarning] {
        &self.parse_warnings
    }

    /// Prose lines across the catalog that state a MUST, SHOULD, or MAY.
    pub fn requirement_lines(&self) -> usize {
        self.requirement_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_core::Document;
    use specgraph_scan::extract_document;

    fn extraction(path: &str, text: &str) -> FileExtraction {
        extract_document(&Document::new(DocPath::new(path).unwrap(), text.to_string()))
    }

    fn sample() -> Vec<FileExtraction> {
        vec![
            extraction(
                "b.md",
                "## Beta {#beta authority=feature}\nuses [^t1]\n[^t1]: tests/b.py\n",
            ),
            extraction(
                "a.md",
                "## Alpha {#alpha authority=system}\nuses [^t1]\n## Usage\n[^t1]: tests/a.py\n",
            ),
        ]
    }

    #[test]
    fn build_is_order_independent() {
        let forward = Registry::build(sample());
        let mut reversed_input = sample();
        reversed_input.reverse();
        let reversed = Registry::build(reversed_input);
        let ids = |r: &Registry| -> Vec<String> {
            r.sections().iter().map(|s| s.anchor_id.clone()).collect()
        };
        assert_eq!(ids(&forward), vec!["alpha", "beta"]);
        assert_eq!(ids(&forward), ids(&reversed));
    }

    #[test]
    fn has_anchor_respects_provenance() {
        let registry = Registry::build(sample());
        let a = DocPath::new("a.md").unwrap();
        let b = DocPath::new("b.md").unwrap();
        assert!(registry.has_anchor(&a, "alpha", false));
        assert!(!registry.has_anchor(&b, "alpha", false));
        assert!(registry.has_anchor(&a, "usage", true));
        assert!(!registry.has_anchor(&a, "usage", false));
    }

    #[test]
    fn references_prefer_local_definition() {
        let registry = Registry::build(sample());
        let in_b = registry
            .footnote_refs()
            .iter()
            .find(|r| r.doc_path.as_str() == "b.md")
            .unwrap();
        assert_eq!(
            registry.resolve_reference(in_b).unwrap().target_path,
            "tests/b.py"
        );
    }

    #[test]
    fn references_fall_back_to_first_definition() {
        let registry = Registry::build(vec![
            extraction("z.md", "cites [^shared]\n"),
            extraction("m.md", "[^shared]: tests/m.py\n"),
            extraction("n.md", "[^shared]: tests/n.py\n"),
        ]);
        let reference = &registry.footnote_refs()[0];
        assert_eq!(
            registry.resolve_reference(reference).unwrap().doc_path.as_str(),
            "m.md"
        );
    }

    #[test]
    fn duplicate_anchors_report_every_location() {
        let registry = Registry::build(vec![
            extraction("a.md", "## One {#dup}\n## Two {#dup}\n"),
            extraction("b.md", "## Three {#dup}\n## Unique {#unique}\n"),
        ]);
        let duplicates = registry.duplicate_anchors();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].anchor_id, "dup");
        let rendered: Vec<_> = duplicates[0].locations.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a.md:1", "a.md:2", "b.md:1"]);
    }

    #[test]
    fn implicit_slugs_never_count_as_duplicates() {
        let registry = Registry::build(vec![
            extraction("a.md", "## Usage\n"),
            extraction("b.md", "## Usage\n"),
        ]);
        assert!(registry.duplicate_anchors().is_empty());
    }
}
