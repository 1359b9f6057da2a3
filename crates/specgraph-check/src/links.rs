//! # Hyperlink Integrity
//!
//! Every internal link must reach an existing file, and every `#anchor` must
//! exist in the document it points at. Anchors are checked against the
//! global index filtered by provenance, so an anchor declared in another
//! document never satisfies a link.

use serde::Serialize;

use specgraph_core::{DocPath, Hyperlink, LinkTarget};
use specgraph_scan::DocumentLoader;

use crate::disk::{Disk, EntryKind};
use crate::issue::{Issue, IssueKind};
use crate::registry::Registry;

/// Why a link is broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BrokenReason {
    /// Nothing exists at the target path.
    MissingFile {
        /// Resolved target.
        target: DocPath,
    },
    /// The target exists but does not define the anchor.
    MissingAnchor {
        /// Document that was searched.
        target: DocPath,
        /// The anchor that was not found.
        anchor: String,
    },
    /// The relative path climbs above the repository root.
    OutsideRoot,
}

/// A link that does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    /// Document containing the link.
    pub source_doc: DocPath,
    /// Line of the link.
    pub source_line: usize,
    /// Destination as written.
    pub raw_href: String,
    /// What went wrong.
    pub reason: BrokenReason,
}

impl BrokenLink {
    /// The flat issue for this link.
    pub fn to_issue(&self) -> Issue {
        let message = match &self.reason {
            BrokenReason::MissingFile { target } => {
                format!("broken link {}: {} does not exist", self.raw_href, target)
            }
            BrokenReason::MissingAnchor { target, anchor } => {
                format!("broken link {}: no anchor #{} in {}", self.raw_href, anchor, target)
            }
            BrokenReason::OutsideRoot => {
                format!("broken link {}: target is outside the repository", self.raw_href)
            }
        };
        Issue::error(
            IssueKind::BrokenLink,
            self.source_doc.as_str(),
            Some(self.source_line),
            message,
        )
    }
}

/// Link checker over a finished registry.
pub struct LinkChecker<'a> {
    registry: &'a Registry,
    disk: &'a Disk,
    loader: &'a DocumentLoader,
    implicit_anchors: bool,
}

impl<'a> LinkChecker<'a> {
    /// A checker; `implicit_anchors` lets heading slugs satisfy anchors.
    pub fn new(
        registry: &'a Registry,
        disk: &'a Disk,
        loader: &'a DocumentLoader,
        implicit_anchors: bool,
    ) -> Self {
        Self {
            registry,
            disk,
            loader,
            implicit_anchors,
        }
    }

    /// Check every link in the registry.
    pub fn check_all(&self) -> Vec<BrokenLink> {
        self.registry
            .hyperlinks()
            .iter()
            .filter_map(|link| self.check(link))
            .collect()
    }

    /// Check one link, `None` when it resolves.
    pub fn check(&self, link: &Hyperlink) -> Option<BrokenLink> {
        let broken = |reason| BrokenLink {
            source_doc: link.source_doc.clone(),
            source_line: link.source_line,
            raw_href: link.raw_href.clone(),
            reason,
        };

        let target = match &link.target {
            LinkTarget::OutsideRoot(_) => return Some(broken(BrokenReason::OutsideRoot)),
            LinkTarget::SameFile => link.source_doc.clone(),
            LinkTarget::Path(path) => path.clone(),
        };

        // Self-links only ever see the source document's own anchors.
        if link.is_self_link() {
            return link
                .target_anchor
                .as_deref()
                .filter(|anchor| !self.anchor_in_loaded(&target, anchor))
                .map(|anchor| {
                    broken(BrokenReason::MissingAnchor {
                        target: target.clone(),
                        anchor: anchor.to_string(),
                    })
                });
        }

        let anchor_doc = if self.registry.contains_document(&target) {
            target.clone()
        } else {
            match self.disk.entry(&target) {
                EntryKind::Missing => {
                    return Some(broken(BrokenReason::MissingFile { target }));
                }
                EntryKind::File => target.clone(),
                EntryKind::Dir => target.child("README.md"),
            }
        };

        let anchor = link.target_anchor.as_deref()?;

        if self.registry.contains_document(&anchor_doc) {
            return (!self.anchor_in_loaded(&anchor_doc, anchor)).then(|| {
                broken(BrokenReason::MissingAnchor {
                    target: anchor_doc.clone(),
                    anchor: anchor.to_string(),
                })
            });
        }

        if !anchor_doc.is_markdown() {
            return None;
        }
        match self.disk.entry(&anchor_doc) {
            EntryKind::File => {
                if self.loader.is_excluded(&anchor_doc) {
                    tracing::debug!(
                        target_doc = %anchor_doc,
                        anchor,
                        "anchor target excluded from loading, not verified"
                    );
                } else {
                    tracing::debug!(
                        target_doc = %anchor_doc,
                        anchor,
                        "anchor target was not loaded, not verified"
                    );
                }
                None
            }
            // A directory without a README has no anchors at all.
            EntryKind::Missing | EntryKind::Dir => Some(broken(BrokenReason::MissingAnchor {
                target: anchor_doc,
                anchor: anchor.to_string(),
            })),
        }
    }

    fn anchor_in_loaded(&self, doc: &DocPath, anchor: &str) -> bool {
        self.registry.has_anchor(doc, anchor, self.implicit_anchors)
    }
}
