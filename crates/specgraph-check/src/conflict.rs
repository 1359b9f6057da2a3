//! # Authority Conflicts
//!
//! Authority-bearing sections are grouped by a topic key. Within a group:
//!
//! - two sections declaring the same anchor id always conflict;
//! - any other pair is handed to a [`ConflictHeuristic`], which decides from
//!   their authority levels or content whether they contradict.
//!
//! Detection is conservative. The default heuristic flags nothing, so a
//! clean catalog never fails because of wording. [`ModalHeuristic`] only
//! compares `system` pairs; [`LevelGapHeuristic`] flags pairs whose levels
//! are more than one step apart and is usually combined with
//! [`TopicKey::Keyword`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use specgraph_core::{AnchoredSection, Authority, DocPath};
use specgraph_scan::markdown::github_slug;

use crate::issue::{Issue, IssueKind};
use crate::options::{HeuristicKind, TopicKey};
use crate::registry::Registry;

/// Decides whether two authority-bearing sections in the same topic
/// contradict.
pub trait ConflictHeuristic: Send + Sync {
    /// A reason when `a` and `b` conflict, `None` otherwise.
    fn conflict(&self, a: &AnchoredSection, b: &AnchoredSection) -> Option<String>;
}

/// Never reports a content conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeuristic;

impl ConflictHeuristic for NoHeuristic {
    fn conflict(&self, _: &AnchoredSection, _: &AnchoredSection) -> Option<String> {
        None
    }
}

/// Flags `MUST <phrase>` in one `system` section against `MUST NOT <phrase>`
/// in another, comparing phrases after normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalHeuristic;

static MODAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bMUST(\s+NOT)?\s+([^.;]+)").expect("static modal regex")
});

static FOOTNOTE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^[^\]]*\]").expect("static footnote ref regex"));

impl ModalHeuristic {
    /// `(negated, normalized phrase)` for every MUST clause in `section`.
    fn clauses(section: &AnchoredSection) -> BTreeSet<(bool, String)> {
        section
            .requirements
            .iter()
            .flat_map(|line| {
                MODAL
                    .captures_iter(line)
                    .map(|caps| (caps.get(1).is_some(), normalize_phrase(&caps[2])))
                    .collect::<Vec<_>>()
            })
            .filter(|(_, phrase)| !phrase.is_empty())
            .collect()
    }
}

impl ConflictHeuristic for ModalHeuristic {
    fn conflict(&self, a: &AnchoredSection, b: &AnchoredSection) -> Option<String> {
        if a.authority != Authority::System || b.authority != Authority::System {
            return None;
        }
        let left = Self::clauses(a);
        let right = Self::clauses(b);
        left.iter()
            .find(|(negated, phrase)| right.contains(&(!negated, phrase.clone())))
            .map(|(negated, phrase)| {
                let (must, must_not) = if *negated { (b, a) } else { (a, b) };
                format!(
                    "{} requires \"{phrase}\" but {} forbids it",
                    must.anchor_id, must_not.anchor_id
                )
            })
    }
}

/// Flags two sections whose authority levels differ by more than one step.
/// `system` against `platform` is tolerated, `system` against `feature` is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelGapHeuristic;

impl ConflictHeuristic for LevelGapHeuristic {
    fn conflict(&self, a: &AnchoredSection, b: &AnchoredSection) -> Option<String> {
        let gap = a.authority.precedence().abs_diff(b.authority.precedence());
        (gap > 1).then(|| {
            format!(
                "authority levels {} ({}) and {} ({}) are {gap} steps apart",
                a.authority, a.anchor_id, b.authority, b.anchor_id
            )
        })
    }
}

fn normalize_phrase(raw: &str) -> String {
    let without_refs = FOOTNOTE_REF.replace_all(raw, " ");
    without_refs
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The heuristic for a configured kind.
pub fn heuristic_for(kind: HeuristicKind) -> Box<dyn ConflictHeuristic> {
    match kind {
        HeuristicKind::None => Box::new(NoHeuristic),
        HeuristicKind::Modal => Box::new(ModalHeuristic),
        HeuristicKind::LevelGap => Box::new(LevelGapHeuristic),
    }
}

/// One side of a conflict.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SectionRef {
    /// Anchor id.
    pub anchor_id: String,
    /// Declaring document.
    pub doc_path: DocPath,
    /// Heading line.
    pub line: usize,
    /// Declared authority.
    pub authority: Authority,
}

impl From<&AnchoredSection> for SectionRef {
    fn from(section: &AnchoredSection) -> Self {
        Self {
            anchor_id: section.anchor_id.clone(),
            doc_path: section.doc_path.clone(),
            line: section.line,
            authority: section.authority,
        }
    }
}

/// Two sections in the same topic that cannot both hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorityConflict {
    /// Topic key shared by both sections.
    pub topic: String,
    /// Earlier section (path then line order).
    pub first: SectionRef,
    /// Later section.
    pub second: SectionRef,
    /// Why they conflict.
    pub reason: String,
}

impl AuthorityConflict {
    /// The flat issue, located at the later section.
    pub fn to_issue(&self) -> Issue {
        Issue::error(
            IssueKind::AuthorityConflict,
            self.second.doc_path.as_str(),
            Some(self.second.line),
            format!(
                "conflicts with {} at {}:{} (topic {}): {}",
                self.first.anchor_id, self.first.doc_path, self.first.line, self.topic, self.reason
            ),
        )
    }
}

/// Topic of `section` under `key`.
pub fn topic_of(section: &AnchoredSection, key: TopicKey) -> String {
    match key {
        TopicKey::Ancestor => section.topic.clone(),
        TopicKey::Title => {
            let slug = github_slug(&section.title);
            if slug.is_empty() {
                section.anchor_id.clone()
            } else {
                slug
            }
        }
        TopicKey::Document => section.doc_path.to_string(),
        TopicKey::Anchor => section.anchor_id.clone(),
        TopicKey::Keyword => keyword_topic(&section.title).to_string(),
    }
}

const KEYWORD_TOPICS: [(&str, &[&str]); 4] = [
    ("cli", &["cli", "command"]),
    ("validation", &["validation", "input"]),
    ("security", &["security", "auth"]),
    ("output", &["output", "format"]),
];

/// First keyword area whose words appear in `title`, else `general`.
fn keyword_topic(title: &str) -> &'static str {
    let lowered = title.to_lowercase();
    KEYWORD_TOPICS
        .iter()
        .find(|(_, words)| words.iter().any(|word| lowered.contains(word)))
        .map_or("general", |(topic, _)| topic)
}

/// Find conflicts among the authority-bearing sections of `registry`.
pub fn detect_conflicts(
    registry: &Registry,
    key: TopicKey,
    heuristic: &dyn ConflictHeuristic,
) -> Vec<AuthorityConflict> {
    let mut groups: BTreeMap<String, Vec<&AnchoredSection>> = BTreeMap::new();
    for section in registry.authority_sections() {
        groups.entry(topic_of(section, key)).or_default().push(section);
    }

    let mut conflicts = Vec::new();
    for (topic, mut members) in groups {
        members.sort_by(|a, b| (&a.doc_path, a.line).cmp(&(&b.doc_path, b.line)));
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                let reason = if a.anchor_id == b.anchor_id {
                    Some(duplicate_reason(a, b))
                } else {
                    heuristic.conflict(a, b)
                };
                if let Some(reason) = reason {
                    conflicts.push(AuthorityConflict {
                        topic: topic.clone(),
                        first: SectionRef::from(*a),
                        second: SectionRef::from(*b),
                        reason,
                    });
                }
            }
        }
    }

    tracing::debug!(conflicts = conflicts.len(), topic_key = %key, "conflict detection finished");
    conflicts
}

fn duplicate_reason(a: &AnchoredSection, b: &AnchoredSection) -> String {
    if a.authority == b.authority {
        format!("duplicate authority-bearing anchor {}", a.anchor_id)
    } else {
        format!(
            "duplicate authority-bearing anchor {} declared {} and {}",
            a.anchor_id, a.authority, b.authority
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_core::Document;
    use specgraph_scan::extract_document;

    fn registry(files: &[(&str, &str)]) -> Registry {
        Registry::build(
            files
                .iter()
                .map(|(path, text)| {
                    extract_document(&Document::new(DocPath::new(path).unwrap(), text.to_string()))
                })
                .collect(),
        )
    }

    #[test]
    fn duplicate_authority_anchor_with_differing_levels() {
        let reg = registry(&[
            ("a.md", "## Security Sandbox {#security_sandbox authority=system}\n"),
            ("b.md", "## Security Sandbox {#security_sandbox authority=feature}\n"),
        ]);
        let conflicts = detect_conflicts(&reg, TopicKey::Ancestor, &NoHeuristic);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].topic, "security-sandbox");
        assert_eq!(conflicts[0].first.doc_path.as_str(), "a.md");
        assert!(conflicts[0].reason.contains("system and feature"));
        let issue = conflicts[0].to_issue();
        assert_eq!(issue.file, "b.md");
        assert_eq!(issue.kind, IssueKind::AuthorityConflict);
    }

    #[test]
    fn default_heuristic_never_flags_content() {
        let reg = registry(&[(
            "a.md",
            "# Auth\n## Login {#login authority=system}\nThe client MUST cache tokens\n## Cache {#cache authority=system}\nThe client MUST NOT cache tokens\n",
        )]);
        assert!(detect_conflicts(&reg, TopicKey::Ancestor, &NoHeuristic).is_empty());
    }

    #[test]
    fn modal_heuristic_flags_must_vs_must_not() {
        let reg = registry(&[(
            "a.md",
            "# Auth\n## Login {#login authority=system}\nThe client MUST cache tokens [^t1].\n## Cache {#cache authority=system}\nThe client MUST NOT cache tokens.\n",
        )]);
        let conflicts = detect_conflicts(&reg, TopicKey::Ancestor, &ModalHeuristic);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].topic, "auth");
        assert_eq!(conflicts[0].reason, "login requires \"cache tokens\" but cache forbids it");
    }

    #[test]
    fn modal_heuristic_ignores_non_system_pairs() {
        let reg = registry(&[(
            "a.md",
            "# Auth\n## Login {#login authority=system}\nMUST cache tokens\n## Cache {#cache authority=platform}\nMUST NOT cache tokens\n",
        )]);
        assert!(detect_conflicts(&reg, TopicKey::Ancestor, &ModalHeuristic).is_empty());
    }

    #[test]
    fn different_topics_never_conflict() {
        let reg = registry(&[
            ("a.md", "# One\n## X {#x authority=system}\nMUST log\n"),
            ("b.md", "# Two\n## Y {#y authority=system}\nMUST NOT log\n"),
        ]);
        assert!(detect_conflicts(&reg, TopicKey::Ancestor, &ModalHeuristic).is_empty());
        assert_eq!(detect_conflicts(&reg, TopicKey::Title, &ModalHeuristic).len(), 0);
    }

    #[test]
    fn none_authority_sections_are_ignored() {
        let reg = registry(&[
            ("a.md", "## Overview {#overview}\n"),
            ("b.md", "## Overview {#overview}\n"),
        ]);
        assert!(detect_conflicts(&reg, TopicKey::Anchor, &NoHeuristic).is_empty());
    }

    #[test]
    fn topic_keys() {
        let reg = registry(&[("docs/a.md", "# Top\n## Rate Limits {#rate authority=system}\n")]);
        let section = &reg.sections()[0];
        assert_eq!(topic_of(section, TopicKey::Ancestor), "top");
        assert_eq!(topic_of(section, TopicKey::Title), "rate-limits");
        assert_eq!(topic_of(section, TopicKey::Document), "docs/a.md");
        assert_eq!(topic_of(section, TopicKey::Anchor), "rate");
    }

    #[test]
    fn keyword_topics_group_by_title_words() {
        let reg = registry(&[(
            "a.md",
            "## Command Line {#cmd authority=system}\n## Auth Tokens {#tok authority=feature}\n## Output Format {#fmt authority=platform}\n## Input Rules {#inp authority=system}\n## Misc {#misc authority=feature}\n",
        )]);
        let topics: Vec<_> = reg
            .sections()
            .iter()
            .map(|s| topic_of(s, TopicKey::Keyword))
            .collect();
        assert_eq!(topics, vec!["cli", "security", "output", "validation", "general"]);
    }

    #[test]
    fn level_gap_flags_system_against_feature() {
        let reg = registry(&[
            ("a.md", "## CLI Requirements {#cli_system authority=system}\nMUST parse\n"),
            ("b.md", "## CLI Flags {#cli_feature authority=feature}\nMAY parse\n"),
            ("c.md", "## Command Aliases {#cli_platform authority=platform}\n"),
        ]);
        let conflicts = detect_conflicts(&reg, TopicKey::Keyword, &LevelGapHeuristic);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].topic, "cli");
        assert_eq!(conflicts[0].first.anchor_id, "cli_system");
        assert_eq!(conflicts[0].second.anchor_id, "cli_feature");
        assert!(conflicts[0].reason.contains("2 steps apart"));
    }

    #[test]
    fn level_gap_ignores_adjacent_levels() {
        let reg = registry(&[(
            "a.md",
            "## Security Core {#sec_a authority=system}\n## Security Edge {#sec_b authority=platform}\n",
        )]);
        assert!(detect_conflicts(&reg, TopicKey::Keyword, &LevelGapHeuristic).is_empty());
    }

    #[test]
    fn phrases_are_normalized() {
        assert_eq!(normalize_phrase("  Cache   TOKENS [^t] "), "cache tokens");
    }
}
