//! # Validation Options
//!
//! Settings that change what the validator reports. The CLI layers config
//! file, environment, and flags into one [`CheckOptions`] value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OptionParseError;

/// How authority-bearing sections are grouped before conflict detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKey {
    /// Nearest enclosing H1/H2 heading, else the section's own title.
    #[default]
    Ancestor,
    /// The section's own heading slug.
    Title,
    /// The declaring document.
    Document,
    /// The anchor id.
    Anchor,
    /// A coarse area picked from keywords in the title: `cli`, `validation`,
    /// `security`, `output`, else `general`.
    Keyword,
}

impl TopicKey {
    /// All accepted values, for help text.
    pub const VARIANTS: [&'static str; 5] = ["ancestor", "title", "document", "anchor", "keyword"];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ancestor => "ancestor",
            Self::Title => "title",
            Self::Document => "document",
            Self::Anchor => "anchor",
            Self::Keyword => "keyword",
        }
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicKey {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ancestor" => Ok(Self::Ancestor),
            "title" => Ok(Self::Title),
            "document" => Ok(Self::Document),
            "anchor" => Ok(Self::Anchor),
            "keyword" => Ok(Self::Keyword),
            other => Err(OptionParseError {
                option: "topic key",
                value: other.to_string(),
                expected: &Self::VARIANTS,
            }),
        }
    }
}

/// Which check decides whether two sections in one topic contradict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeuristicKind {
    /// Never flag on content; only duplicate anchors are conflicts.
    #[default]
    None,
    /// Flag `MUST x` against `MUST NOT x` between two `system` sections.
    Modal,
    /// Flag authority levels more than one step apart, such as `system`
    /// against `feature`.
    LevelGap,
}

impl HeuristicKind {
    /// All accepted values, for help text.
    pub const VARIANTS: [&'static str; 3] = ["none", "modal", "level-gap"];

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Modal => "modal",
            Self::LevelGap => "level-gap",
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeuristicKind {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "modal" => Ok(Self::Modal),
            "level-gap" => Ok(Self::LevelGap),
            other => Err(OptionParseError {
                option: "conflict heuristic",
                value: other.to_string(),
                expected: &Self::VARIANTS,
            }),
        }
    }
}

/// Everything that shapes one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOptions {
    /// Uncovered authority sections are errors instead of warnings.
    pub check_coverage: bool,
    /// Run authority conflict detection.
    pub authority_conflicts: bool,
    /// Treat warnings as errors.
    pub strict: bool,
    /// Conflict grouping strategy.
    pub topic_key: TopicKey,
    /// Heuristic applied to same-topic pairs.
    pub conflict_heuristic: HeuristicKind,
    /// Report catalog-wide syntax gaps (no anchors, no authority levels, no
    /// test references, no requirement keywords).
    pub validate_syntax: bool,
    /// Heading slugs satisfy link anchors.
    pub implicit_heading_anchors: bool,
    /// Glob patterns excluded from loading.
    pub exclude: Vec<String>,
    /// Worker thread count.
    pub jobs: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_coverage: false,
            authority_conflicts: false,
            strict: false,
            topic_key: TopicKey::default(),
            conflict_heuristic: HeuristicKind::default(),
            validate_syntax: false,
            implicit_heading_anchors: true,
            exclude: Vec::new(),
            jobs: specgraph_scan::default_workers(),
        }
    }
}
