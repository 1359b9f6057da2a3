//! # Authority Levels
//!
//! The precedence tag carried by an anchored section. When two requirements
//! disagree, the one with higher authority wins:
//! `system` > `platform` > `feature` > `none`.
//!
//! Sections without an `authority=` attribute are informational
//! ([`Authority::None`]) and do not count towards coverage.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthorityParseError;

/// Authority level declared by an anchor tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authority {
    /// No authority declared. Informational only.
    None,
    /// Feature-level requirement.
    Feature,
    /// Platform-level requirement.
    Platform,
    /// System-level requirement. Highest precedence.
    System,
}

impl Authority {
    /// Numeric precedence; higher wins.
    pub fn precedence(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Feature => 1,
            Self::Platform => 2,
            Self::System => 3,
        }
    }

    /// Whether this section is a behavioral contract (counts for coverage).
    pub fn is_binding(self) -> bool {
        self != Self::None
    }

    /// The lowercase name used in anchor tags and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Feature => "feature",
            Self::Platform => "platform",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Authority {
    type Err = AuthorityParseError;

    /// Parses the value of an `authority=` attribute.
    ///
    /// `none` is accepted so that a tag may state it explicitly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "platform" => Ok(Self::Platform),
            "feature" => Ok(Self::Feature),
            "none" => Ok(Self::None),
            other => Err(AuthorityParseError {
                value: other.to_string(),
            }),
        }
    }
}
