//! # Catalog Syntax
//!
//! Opt-in checks on the catalog as a whole rather than on single lines: a
//! tree with no anchored headings, no authority levels, no test references,
//! or no requirement keywords is probably not using the catalog format at
//! all. Each gap is one warning located at the repository root.

use crate::issue::{Issue, IssueKind};
use crate::registry::Registry;

/// File reported for catalog-wide findings.
pub const CATALOG_FILE: &str = ".";

/// One warning per missing catalog element.
pub fn catalog_syntax_issues(registry: &Registry) -> Vec<Issue> {
    let gaps = [
        (
            registry.sections().is_empty(),
            "no anchored headings found (format: ## Title {#anchor})",
        ),
        (
            registry.authority_sections().next().is_none(),
            "no authority levels found (format: {#anchor authority=system|platform|feature})",
        ),
        (
            registry.footnote_defs().is_empty(),
            "no test references found (format: [^test_id]: tests/path)",
        ),
        (
            registry.requirement_lines() == 0,
            "no requirement strength indicators found (MUST/SHOULD/MAY)",
        ),
    ];

    gaps.into_iter()
        .filter(|(missing, _)| *missing)
        .map(|(_, message)| Issue::warning(IssueKind::CatalogSyntax, CATALOG_FILE, None, message))
        .collect()
}
