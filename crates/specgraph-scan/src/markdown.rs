//! # Markdown Scanning
//!
//! Each document is parsed once with `pulldown-cmark`. The extractors then
//! read the result line by line and need only a few facts: which lines are
//! verbatim (code blocks and raw HTML blocks), what each line looks like
//! with inline code spans blanked out, where the headings are, and which
//! link destinations the parser recognized.
//!
//! Byte ranges from the parser's offset iterator become line numbers through
//! [`Document::line_at`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use specgraph_core::Document;

/// One line of a document with its scanning context.
#[derive(Debug, Clone, Copy)]
pub struct ScannedLine<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Line text without terminator.
    pub text: &'a str,
    /// `text` with inline code spans, backticks included, replaced by spaces.
    /// Byte offsets match `text`.
    pub prose: &'a str,
    /// Inside a code block or a raw HTML block.
    pub in_code: bool,
    /// Part of a heading, setext underline included.
    pub in_heading: bool,
}

/// An ATX or setext heading as the parser saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedHeading {
    /// First line of the heading.
    pub line: usize,
    /// Last line, which is the underline for setext headings.
    pub end_line: usize,
    /// 1 to 6.
    pub level: u8,
    /// Heading content without markers or closing hashes. Multi-line
    /// content is joined with single spaces.
    pub text: String,
    /// `text` with inline code blanked, same byte offsets.
    pub prose: String,
}

/// A link or image destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLink {
    /// Line where the link starts.
    pub line: usize,
    /// Destination with angle brackets, title, and escapes already removed.
    pub destination: String,
}

/// One parse of one document.
#[derive(Debug)]
pub struct MarkdownScan {
    prose: String,
    code_lines: Vec<bool>,
    heading_lines: Vec<bool>,
    /// Headings in document order.
    pub headings: Vec<ScannedHeading>,
    /// Links and images in document order.
    pub links: Vec<ScannedLink>,
    /// Opening line of the first fenced block that is never closed.
    pub unterminated_fence: Option<usize>,
}

struct OpenHeading {
    range: Range<usize>,
    level: u8,
    content: Option<Range<usize>>,
}

impl MarkdownScan {
    /// Parse `doc`.
    pub fn new(doc: &Document) -> Self {
        let text = doc.raw_text.as_str();
        let line_count = doc.line_count();
        let mut masked = text.as_bytes().to_vec();
        let mut code_lines = vec![false; line_count];
        let mut heading_lines = vec![false; line_count];
        let mut headings = Vec::new();
        let mut links = Vec::new();
        let mut unterminated_fence = None;
        let mut open: Option<OpenHeading> = None;

        for (event, range) in Parser::new_ext(text, Options::ENABLE_FOOTNOTES).into_offset_iter() {
            if let Some(heading) = open.as_mut() {
                if !matches!(event, Event::End(TagEnd::Heading(_))) {
                    heading.content = Some(match heading.content.take() {
                        Some(seen) => seen.start.min(range.start)..seen.end.max(range.end),
                        None => range.clone(),
                    });
                }
            }

            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    open = Some(OpenHeading {
                        range,
                        level: heading_level(level),
                        content: None,
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(heading) = open.take() {
                        mark_lines(doc, &mut heading_lines, &heading.range);
                        let content = heading
                            .content
                            .unwrap_or(heading.range.start..heading.range.start);
                        let (text, prose) = flatten(&text[content.clone()], &masked[content]);
                        headings.push(ScannedHeading {
                            line: doc.line_at(heading.range.start),
                            end_line: last_line(doc, &heading.range),
                            level: heading.level,
                            text,
                            prose,
                        });
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    mark_lines(doc, &mut code_lines, &range);
                    if matches!(kind, CodeBlockKind::Fenced(_)) && !fence_is_closed(&text[range.clone()]) {
                        unterminated_fence.get_or_insert(doc.line_at(range.start));
                    }
                }
                Event::Start(Tag::HtmlBlock) => mark_lines(doc, &mut code_lines, &range),
                Event::Code(_) => {
                    for byte in &mut masked[range] {
                        if *byte != b'\n' && *byte != b'\r' {
                            *byte = b' ';
                        }
                    }
                }
                Event::Start(Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. }) => {
                    links.push(ScannedLink {
                        line: doc.line_at(range.start),
                        destination: dest_url.into_string(),
                    });
                }
                _ => {}
            }
        }

        // Code spans start and end on backticks, so blanking never splits a
        // multi-byte character.
        let prose = String::from_utf8(masked).unwrap_or_else(|_| text.to_string());

        Self {
            prose,
            code_lines,
            heading_lines,
            headings,
            links,
            unterminated_fence,
        }
    }

    /// Every line of `doc` with its classification.
    pub fn lines<'a>(&'a self, doc: &'a Document) -> Vec<ScannedLine<'a>> {
        doc.lines()
            .map(|(number, text)| {
                let start = doc.line_offsets.get(number - 1).copied().unwrap_or(0);
                ScannedLine {
                    number,
                    text,
                    prose: self.prose.get(start..start + text.len()).unwrap_or(text),
                    in_code: self.code_lines.get(number - 1).copied().unwrap_or(false),
                    in_heading: self.heading_lines.get(number - 1).copied().unwrap_or(false),
                }
            })
            .collect()
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn last_line(doc: &Document, range: &Range<usize>) -> usize {
    doc.line_at(range.end.saturating_sub(1).max(range.start))
}

fn mark_lines(doc: &Document, flags: &mut [bool], range: &Range<usize>) {
    if range.is_empty() {
        return;
    }
    for number in doc.line_at(range.start)..=last_line(doc, range) {
        if let Some(flag) = number.checked_sub(1).and_then(|idx| flags.get_mut(idx)) {
            *flag = true;
        }
    }
}

/// Join multi-line heading content into one line, trimming each piece the
/// same way in both the raw and the masked text.
fn flatten(raw: &str, masked: &[u8]) -> (String, String) {
    let mut text = String::new();
    let mut prose = String::new();
    let mut offset = 0;
    for (idx, piece) in raw.split('\n').enumerate() {
        let lead = if idx == 0 {
            piece.len() - piece.trim_start().len()
        } else {
            piece.len() - piece.trim_start_matches(|c: char| c == '>' || c.is_whitespace()).len()
        };
        let end = piece.trim_end().len();
        if lead < end {
            if !text.is_empty() {
                text.push(' ');
                prose.push(' ');
            }
            text.push_str(&piece[lead..end]);
            prose.push_str(&String::from_utf8_lossy(&masked[offset + lead..offset + end]));
        }
        offset += piece.len() + 1;
    }
    (text, prose)
}

fn fence_run(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start_matches(|c: char| c == '>' || c.is_whitespace());
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then(|| (ch, len, &trimmed[len..]))
}

/// Whether a fenced block's source ends with a matching closing fence.
fn fence_is_closed(block: &str) -> bool {
    let mut lines = block.trim_end_matches(['\n', '\r']).lines();
    let Some((ch, len, _)) = lines.next().and_then(fence_run) else {
        return true;
    };
    lines
        .last()
        .and_then(fence_run)
        .is_some_and(|(c, l, rest)| c == ch && l >= len && rest.trim().is_empty())
}

/// GitHub-style heading slug: formatting stripped, lowercased, whitespace
/// collapsed to `-`, everything but word characters and `-` removed.
pub fn github_slug(heading: &str) -> String {
    let text = strip_inline_formatting(heading);
    let lowered = text.trim().to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if c.is_alphanumeric() || c == '_' || c == '-' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(c);
        }
    }
    slug.trim_matches('-').to_string()
}

/// Remove link syntax, code ticks, emphasis markers, and HTML tags, keeping text.
fn strip_inline_formatting(text: &str) -> Cow<'_, str> {
    static LINK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("static link regex"));
    static TAG: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static html tag regex"));

    if !text.contains(['[', '<', '*', '_', '`']) {
        return Cow::Borrowed(text);
    }
    let text = LINK.replace_all(text, "$1");
    let text = TAG.replace_all(&text, "");
    Cow::Owned(
        text.replace("**", "")
            .replace("__", "")
            .replace(['*', '`'], ""),
    )
}

/// Assigns GitHub's `-1`, `-2`, … suffixes to repeated slugs within a file.
#[derive(Debug, Default)]
pub struct SlugCounter {
    seen: HashMap<String, usize>,
}

impl SlugCounter {
    /// The unique slug for the next heading with this base slug.
    pub fn next(&mut self, base: String) -> String {
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_core::DocPath;

    fn doc(text: &str) -> Document {
        Document::new(DocPath::new("t.md").unwrap(), text.to_string())
    }

    fn code_flags(text: &str) -> Vec<bool> {
        let d = doc(text);
        let scan = MarkdownScan::new(&d);
        scan.lines(&d).iter().map(|l| l.in_code).collect()
    }

    fn headings(text: &str) -> Vec<(usize, u8, String)> {
        MarkdownScan::new(&doc(text))
            .headings
            .into_iter()
            .map(|h| (h.line, h.level, h.text))
            .collect()
    }

    #[test]
    fn fences_mark_contained_lines() {
        assert_eq!(
            code_flags("a\n```rust\n# not heading\n```\nb"),
            vec![false, true, true, true, false]
        );
    }

    #[test]
    fn fence_requires_matching_char_and_length() {
        let flags = code_flags("````\n```\nstill code\n````\nout");
        assert!(flags[2]);
        assert!(!flags[4]);
    }

    #[test]
    fn tilde_fence_not_closed_by_backticks() {
        let flags = code_flags("~~~\n```\n~~~\nafter");
        assert!(flags[1]);
        assert!(!flags[3]);
    }

    #[test]
    fn unterminated_fence_is_reported() {
        let scan = MarkdownScan::new(&doc("text\n\n```\ncode"));
        assert_eq!(scan.unterminated_fence, Some(3));
        let closed = MarkdownScan::new(&doc("```\ncode\n```\n"));
        assert_eq!(closed.unterminated_fence, None);
    }

    #[test]
    fn indented_code_block_is_code() {
        let d = doc("## Real\n\n    ## Example\n\ntext\n");
        let scan = MarkdownScan::new(&d);
        assert_eq!(scan.headings.len(), 1);
        assert!(scan.lines(&d)[2].in_code);
    }

    #[test]
    fn html_blocks_are_verbatim() {
        let d = doc("<!--\n## Hidden\n-->\n\n## Shown\n");
        let scan = MarkdownScan::new(&d);
        assert_eq!(scan.headings.len(), 1);
        assert_eq!(scan.headings[0].text, "Shown");
        assert!(scan.lines(&d)[1].in_code);
    }

    #[test]
    fn inline_code_is_blanked_in_prose() {
        let d = doc("see `[^fake]` and [^real]\n");
        let scan = MarkdownScan::new(&d);
        let line = scan.lines(&d)[0];
        assert_eq!(line.prose.len(), line.text.len());
        assert!(!line.prose.contains("fake"));
        assert!(line.prose.contains("[^real]"));
    }

    #[test]
    fn double_backtick_spans_are_blanked() {
        let d = doc("x ``a ` b`` y\n");
        let scan = MarkdownScan::new(&d);
        assert_eq!(scan.lines(&d)[0].prose.trim_start_matches('x').trim(), "y");
    }

    #[test]
    fn atx_heading_levels_and_text() {
        assert_eq!(
            headings("## CLI Requirements\n\n###### deep ##\n\n> # quoted\n\n## C#\n\n#hashtag\n"),
            vec![
                (1, 2, "CLI Requirements".to_string()),
                (3, 6, "deep".to_string()),
                (5, 1, "quoted".to_string()),
                (7, 2, "C#".to_string()),
            ]
        );
    }

    #[test]
    fn setext_headings_are_found() {
        let d = doc("Overview\n========\n\nDetails\n---\n");
        let scan = MarkdownScan::new(&d);
        assert_eq!(
            headings("Overview\n========\n\nDetails\n---\n"),
            vec![(1, 1, "Overview".to_string()), (4, 2, "Details".to_string())]
        );
        assert_eq!(scan.headings[0].end_line, 2);
        assert!(scan.lines(&d)[1].in_heading);
    }

    #[test]
    fn heading_prose_blanks_inline_code() {
        let scan = MarkdownScan::new(&doc("## Syntax `{#id}` explained\n"));
        let heading = &scan.headings[0];
        assert!(heading.text.contains("{#id}"));
        assert!(!heading.prose.contains("{#"));
        assert_eq!(heading.text.len(), heading.prose.len());
    }

    #[test]
    fn links_and_images_are_collected() {
        let scan = MarkdownScan::new(&doc(
            "[a](a.md)\n\n![img](<b c.png> \"T\")\n\n```\n[x](x.md)\n```\n`[y](y.md)`\n",
        ));
        let found: Vec<_> = scan.links.iter().map(|l| (l.line, l.destination.as_str())).collect();
        assert_eq!(found, vec![(1, "a.md"), (3, "b c.png")]);
    }

    #[test]
    fn github_slug_basic() {
        assert_eq!(github_slug("Security Sandbox"), "security-sandbox");
        assert_eq!(github_slug("Spec-First: **AI** `Dev`!"), "spec-first-ai-dev");
        assert_eq!(github_slug("[Linked](x.md) Title"), "linked-title");
        assert_eq!(github_slug("snake_case name"), "snake_case-name");
    }

    #[test]
    fn slug_counter_suffixes_repeats() {
        let mut counter = SlugCounter::default();
        assert_eq!(counter.next("usage".to_string()), "usage");
        assert_eq!(counter.next("usage".to_string()), "usage-1");
        assert_eq!(counter.next("usage".to_string()), "usage-2");
        assert_eq!(counter.next("other".to_string()), "other");
    }
}
