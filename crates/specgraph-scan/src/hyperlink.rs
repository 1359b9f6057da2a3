//! # Hyperlink Extraction
//!
//! Collects the links and images the markdown parser recognized that point
//! inside the repository. External and non-navigational destinations are
//! dropped here so the resolver only ever sees links it can check.
//!
//! Paths and fragments are percent-decoded before resolution, so
//! `my%20guide.md` names the file `my guide.md`. The raw destination is kept
//! for reporting.

use std::borrow::Cow;

use url::Url;

use specgraph_core::{DocPath, Document, Hyperlink, LinkTarget};

use crate::markdown::MarkdownScan;

const IGNORED_SCHEMES: [&str; 3] = ["mailto:", "tel:", "javascript:"];

/// Extract internal hyperlinks from `doc`.
pub fn extract_hyperlinks(doc: &Document, markdown: &MarkdownScan) -> Vec<Hyperlink> {
    markdown
        .links
        .iter()
        .filter_map(|link| classify(&doc.path, link.line, link.destination.trim()))
        .collect()
}

/// Turn a raw destination into a [`Hyperlink`], or `None` when it is not a
/// checkable in-repository link.
pub fn classify(source: &DocPath, line: usize, raw: &str) -> Option<Hyperlink> {
    if is_ignored(raw) {
        return None;
    }

    let (path_part, fragment) = match raw.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (raw, None),
    };
    let path_part = path_part.split_once('?').map_or(path_part, |(p, _)| p);
    let path_part = percent_decode(path_part);
    let target_anchor = fragment
        .filter(|f| !f.is_empty())
        .map(|f| percent_decode(f).into_owned());

    let target = if path_part.is_empty() {
        if target_anchor.is_none() {
            return None;
        }
        LinkTarget::SameFile
    } else {
        match source.join_link(&path_part) {
            Ok(path) => LinkTarget::Path(path),
            Err(_) => LinkTarget::OutsideRoot(path_part.into_owned()),
        }
    };

    Some(Hyperlink {
        source_doc: source.clone(),
        source_line: line,
        target,
        target_anchor,
        raw_href: raw.to_string(),
    })
}

/// Invalid escapes are left as written.
fn percent_decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

fn is_ignored(raw: &str) -> bool {
    if raw.is_empty() || raw == "#" || raw.starts_with("//") || raw.contains("{{") {
        return true;
    }
    let lowered = raw.to_ascii_lowercase();
    if IGNORED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return true;
    }
    Url::parse(raw).is_ok()
}
