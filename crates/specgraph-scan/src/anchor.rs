//! # Anchor/Authority Extraction
//!
//! Finds headings that carry an explicit anchor tag:
//!
//! ```text
//! ## CLI Requirements {#cli_requirements authority=system}
//! ```
//!
//! The tag may also sit alone on the first non-blank line after the heading.
//! Every heading, tagged or not, also yields an implicit GitHub-style slug so
//! that ordinary table-of-contents links resolve.
//!
//! A malformed tag never aborts the scan: it becomes a [`ParseWarning`] and
//! the heading is still used for section boundaries and implicit slugs.
//!
//! Both ATX (`## Title`) and setext (`Title` over `===`) headings count.
//! Anything inside a code block or a raw HTML block, comments included, is
//! never a heading.

use std::sync::LazyLock;

use regex::Regex;

use specgraph_core::{
    AnchoredSection, Authority, Document, ParseWarning, ParseWarningKind,
};

use crate::markdown::{github_slug, MarkdownScan, ScannedLine, SlugCounter};

static ANCHOR_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.:-]*$").expect("static anchor id regex")
});

static REQUIREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(MUST|SHOULD|MAY)\b").expect("static requirement regex"));

/// Output of scanning one document for headings.
#[derive(Debug, Default)]
pub struct AnchorScan {
    /// Headings with a well-formed anchor tag, in document order.
    pub sections: Vec<AnchoredSection>,
    /// GitHub-style slug of every heading, already de-duplicated.
    pub implicit_slugs: Vec<String>,
    /// Recoverable tag problems.
    pub warnings: Vec<ParseWarning>,
}

/// Result of looking for a `{#…}` tag in a piece of heading text.
#[derive(Debug, PartialEq, Eq)]
enum Tag {
    Absent,
    Found {
        id: String,
        authority: Authority,
        start: usize,
        end: usize,
        problems: Vec<(ParseWarningKind, String)>,
    },
    Malformed {
        start: usize,
        message: String,
    },
}

#[derive(Debug)]
struct Heading {
    line: usize,
    level: u8,
    title: String,
    tag: Tag,
    tag_line: usize,
}

/// Extract anchored sections and implicit slugs from `doc`.
pub fn extract_sections(
    doc: &Document,
    markdown: &MarkdownScan,
    lines: &[ScannedLine<'_>],
) -> AnchorScan {
    let headings = collect_headings(markdown, lines);
    let last_line = doc.line_count();
    let mut scan = AnchorScan::default();
    let mut slugs = SlugCounter::default();

    for (idx, heading) in headings.iter().enumerate() {
        let base = github_slug(&heading.title);
        if !base.is_empty() {
            scan.implicit_slugs.push(slugs.next(base));
        }

        match &heading.tag {
            Tag::Absent => {}
            Tag::Malformed { message, .. } => scan.warnings.push(ParseWarning {
                doc_path: doc.path.clone(),
                line: heading.tag_line,
                kind: ParseWarningKind::MalformedAnchor,
                message: message.clone(),
            }),
            Tag::Found {
                id,
                authority,
                problems,
                ..
            } => {
                for (kind, message) in problems {
                    scan.warnings.push(ParseWarning {
                        doc_path: doc.path.clone(),
                        line: heading.tag_line,
                        kind: *kind,
                        message: message.clone(),
                    });
                }

                let body_end = headings[idx + 1..]
                    .iter()
                    .find(|h| h.level <= heading.level)
                    .map_or(last_line, |h| h.line - 1)
                    .max(heading.line);

                scan.sections.push(AnchoredSection {
                    anchor_id: id.clone(),
                    authority: *authority,
                    title: heading.title.clone(),
                    doc_path: doc.path.clone(),
                    line: heading.line,
                    level: heading.level,
                    body_end,
                    topic: topic_for(&headings[..idx], heading, id),
                    requirements: requirements_in(lines, heading.tag_line + 1, body_end),
                });
            }
        }
    }

    scan
}

fn collect_headings(markdown: &MarkdownScan, lines: &[ScannedLine<'_>]) -> Vec<Heading> {
    let mut headings = Vec::new();
    for scanned in &markdown.headings {
        let mut tag = parse_tag(&scanned.text, &scanned.prose);
        let mut tag_line = scanned.line;
        let mut title_source = scanned.text.clone();

        if tag == Tag::Absent {
            if let Some(next) = next_tag_line(lines, scanned.end_line) {
                let (text, prose) = trimmed_pair(next);
                let trailing = parse_tag(text, prose);
                if matches!(&trailing, Tag::Found { start: 0, end, .. } if *end == text.len())
                    || matches!(&trailing, Tag::Malformed { start: 0, .. })
                {
                    tag_line = next.number;
                    // Offsets in the tag refer to the trailing line, not the heading.
                    tag = rebase_tag(trailing, scanned.text.len() + 1);
                    title_source.push(' ');
                    title_source.push_str(text);
                }
            }
        }

        let title = title_without_tag(&title_source, &tag);
        headings.push(Heading {
            line: scanned.line,
            level: scanned.level,
            title,
            tag,
            tag_line,
        });
    }
    headings
}

/// The first non-blank line after a heading, if it is a paragraph line
/// opening with a tag.
fn next_tag_line<'a, 'b>(lines: &'b [ScannedLine<'a>], after: usize) -> Option<&'b ScannedLine<'a>> {
    let next = lines
        .iter()
        .skip(after)
        .find(|l| !l.text.trim().is_empty())?;
    if next.in_code || next.in_heading {
        return None;
    }
    next.prose.trim_start().starts_with("{#").then_some(next)
}

/// Line text and prose with the same surrounding whitespace removed.
fn trimmed_pair<'a>(line: &ScannedLine<'a>) -> (&'a str, &'a str) {
    let start = line.text.len() - line.text.trim_start().len();
    let end = line.text.trim_end().len().max(start);
    (
        &line.text[start..end],
        line.prose.get(start..end).unwrap_or(""),
    )
}

fn rebase_tag(tag: Tag, offset: usize) -> Tag {
    match tag {
        Tag::Found {
            id,
            authority,
            start,
            end,
            problems,
        } => Tag::Found {
            id,
            authority,
            start: start + offset,
            end: end + offset,
            problems,
        },
        Tag::Malformed { start, message } => Tag::Malformed {
            start: start + offset,
            message,
        },
        Tag::Absent => Tag::Absent,
    }
}

fn title_without_tag(text: &str, tag: &Tag) -> String {
    let cleaned = match tag {
        Tag::Absent => text.to_string(),
        Tag::Found { start, end, .. } => format!("{}{}", &text[..*start], &text[*end..]),
        Tag::Malformed { start, .. } => text[..*start].to_string(),
    };
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse the first `{#…}` tag in `text`, searching `prose` so that tags in
/// inline code are skipped. `end` is one past the closing brace.
fn parse_tag(text: &str, prose: &str) -> Tag {
    let Some(start) = prose.find("{#") else {
        return Tag::Absent;
    };
    let Some(close_rel) = prose[start..].find('}') else {
        return Tag::Malformed {
            start,
            message: "unterminated anchor tag: missing closing '}'".to_string(),
        };
    };
    let end = start + close_rel + 1;
    let Some(inner) = text.get(start + 2..end - 1) else {
        return Tag::Absent;
    };
    let mut tokens = inner.split_whitespace();

    let id = match tokens.next() {
        Some(id) if ANCHOR_ID.is_match(id) => id.to_string(),
        Some(id) => {
            return Tag::Malformed {
                start,
                message: format!("invalid anchor id {id:?}"),
            }
        }
        None => {
            return Tag::Malformed {
                start,
                message: "empty anchor id".to_string(),
            }
        }
    };

    let mut authority = Authority::None;
    let mut problems = Vec::new();
    for token in tokens {
        match token.split_once('=') {
            Some(("authority", value)) => match value.parse::<Authority>() {
                Ok(level) => authority = level,
                Err(e) => problems.push((
                    ParseWarningKind::UnknownAuthority,
                    format!("anchor {id:?}: {e}"),
                )),
            },
            _ => problems.push((
                ParseWarningKind::UnknownAttribute,
                format!("anchor {id:?}: unknown attribute {token:?}"),
            )),
        }
    }

    Tag::Found {
        id,
        authority,
        start,
        end,
        problems,
    }
}

/// Nearest shallower H1/H2 above the section, else the section's own title.
fn topic_for(preceding: &[Heading], section: &Heading, anchor_id: &str) -> String {
    let ancestor = preceding
        .iter()
        .rev()
        .find(|h| h.level <= 2 && h.level < section.level)
        .map(|h| github_slug(&h.title))
        .filter(|slug| !slug.is_empty());
    ancestor
        .or_else(|| Some(github_slug(&section.title)).filter(|slug| !slug.is_empty()))
        .unwrap_or_else(|| anchor_id.to_string())
}

fn requirements_in(lines: &[ScannedLine<'_>], from: usize, to: usize) -> Vec<String> {
    lines
        .iter()
        .filter(|l| l.number >= from && l.number <= to && !l.in_code)
        .filter(|l| REQUIREMENT.is_match(l.prose))
        .map(|l| {
            l.text
                .trim()
                .trim_start_matches(['-', '*', '+'])
                .trim()
                .to_string()
        })
        .collect()
}

/// Number of prose lines outside code that state a MUST, SHOULD, or MAY.
pub fn count_requirement_lines(lines: &[ScannedLine<'_>]) -> usize {
    lines
        .iter()
        .filter(|l| !l.in_code && REQUIREMENT.is_match(l.prose))
        .count()
}
