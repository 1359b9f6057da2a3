//! # Footnote Resolution
//!
//! Binds every `[^id]` citation to a definition and every definition to a
//! test on disk. A definition's target is looked up relative to the
//! repository root first, then relative to the document that defines it.
//! `file::name` additionally requires the file to define a test called
//! `name`.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use url::Url;

use specgraph_core::{DocPath, FootnoteDefinition, FootnoteReference};

use crate::disk::{Disk, EntryKind};
use crate::issue::{Issue, IssueKind};
use crate::registry::Registry;

/// Outcome of looking up a definition's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    /// The file (and named test, if any) exists.
    Exists(DocPath),
    /// An absolute URL, not checked.
    External,
    /// No file at any candidate location.
    Missing,
    /// The file exists but does not define the named test.
    TestNotFound {
        /// File that was searched.
        file: DocPath,
        /// Test name that was not found.
        test: String,
    },
}

impl TargetStatus {
    /// Whether the target counts as a linked test.
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Exists(_) | Self::External)
    }
}

/// A definition whose target could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTarget {
    /// The offending definition.
    pub definition: FootnoteDefinition,
    /// Why the lookup failed.
    pub reason: String,
    /// Cited from inside an authority-bearing section.
    pub cited_by_authority: bool,
}

/// Results of footnote resolution.
#[derive(Debug, Default)]
pub struct FootnoteCheck {
    statuses: HashMap<(DocPath, usize), TargetStatus>,
    /// Citations with no definition anywhere.
    pub orphans: Vec<FootnoteReference>,
    /// Definitions whose id is never cited.
    pub unused: Vec<FootnoteDefinition>,
    /// Second and later definitions of an id.
    pub duplicates: Vec<FootnoteDefinition>,
    /// Definitions whose target does not exist.
    pub missing_targets: Vec<MissingTarget>,
}

impl FootnoteCheck {
    /// Resolve every footnote in `registry`.
    pub fn run(registry: &Registry, disk: &Disk) -> Self {
        let mut check = Self::default();

        for def in registry.footnote_defs() {
            let status = resolve_target(def, disk);
            check
                .statuses
                .insert((def.doc_path.clone(), def.line), status);
        }

        let mut cited: HashSet<&str> = HashSet::new();
        let mut cited_by_authority: HashSet<(DocPath, usize)> = HashSet::new();
        for reference in registry.footnote_refs() {
            cited.insert(reference.footnote_id.as_str());
            match registry.resolve_reference(reference) {
                Some(def) => {
                    let in_authority = registry
                        .sections_in(&reference.doc_path)
                        .any(|s| s.authority.is_binding() && s.contains_line(reference.line));
                    if in_authority {
                        cited_by_authority.insert((def.doc_path.clone(), def.line));
                    }
                }
                None => check.orphans.push(reference.clone()),
            }
        }

        let mut seen_ids: HashSet<&str> = HashSet::new();
        for def in registry.footnote_defs() {
            if !seen_ids.insert(def.footnote_id.as_str()) {
                check.duplicates.push(def.clone());
            }
            if !cited.contains(def.footnote_id.as_str()) {
                check.unused.push(def.clone());
            }
            let key = (def.doc_path.clone(), def.line);
            if let Some(reason) = check.statuses.get(&key).and_then(missing_reason) {
                check.missing_targets.push(MissingTarget {
                    definition: def.clone(),
                    reason,
                    cited_by_authority: cited_by_authority.contains(&key),
                });
            }
        }

        check
    }

    /// Status of the definition `reference` binds to, `None` for orphans.
    pub fn status_of(&self, registry: &Registry, reference: &FootnoteReference) -> Option<&TargetStatus> {
        let def = registry.resolve_reference(reference)?;
        self.statuses.get(&(def.doc_path.clone(), def.line))
    }

    /// Whether `reference` resolves to an existing test.
    pub fn is_linked(&self, registry: &Registry, reference: &FootnoteReference) -> bool {
        self.status_of(registry, reference)
            .is_some_and(TargetStatus::is_linked)
    }

    /// Flat issues for the report.
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        for orphan in &self.orphans {
            issues.push(Issue::error(
                IssueKind::OrphanFootnote,
                orphan.doc_path.as_str(),
                Some(orphan.line),
                format!("footnote [^{}] has no definition", orphan.footnote_id),
            ));
        }
        for def in &self.unused {
            issues.push(Issue::warning(
                IssueKind::UnusedFootnote,
                def.doc_path.as_str(),
                Some(def.line),
                format!("footnote [^{}] is defined but never referenced", def.footnote_id),
            ));
        }
        for def in &self.duplicates {
            issues.push(Issue::warning(
                IssueKind::DuplicateFootnote,
                def.doc_path.as_str(),
                Some(def.line),
                format!("duplicate footnote definition [^{}]", def.footnote_id),
            ));
        }
        for missing in &self.missing_targets {
            let def = &missing.definition;
            let message = format!(
                "footnote [^{}] points to a missing test: {}",
                def.footnote_id, missing.reason
            );
            let issue = if missing.cited_by_authority {
                Issue::error(IssueKind::MissingTestTarget, def.doc_path.as_str(), Some(def.line), message)
            } else {
                Issue::warning(IssueKind::MissingTestTarget, def.doc_path.as_str(), Some(def.line), message)
            };
            issues.push(issue);
        }
        issues
    }
}

fn missing_reason(status: &TargetStatus) -> Option<String> {
    match status {
        TargetStatus::Exists(_) | TargetStatus::External => None,
        TargetStatus::Missing => Some("file not found".to_string()),
        TargetStatus::TestNotFound { file, test } => {
            Some(format!("{file} does not define test {test:?}"))
        }
    }
}

/// Look up the target of `def` on disk.
pub fn resolve_target(def: &FootnoteDefinition, disk: &Disk) -> TargetStatus {
    let (file, test) = def.target_parts();
    if file.is_empty() {
        return TargetStatus::Missing;
    }
    if Url::parse(file).is_ok() {
        return TargetStatus::External;
    }

    let candidates = [DocPath::new(file), def.doc_path.join_link(file)];
    let mut found_file: Option<DocPath> = None;
    for candidate in candidates.into_iter().flatten() {
        match (disk.entry(&candidate), test) {
            (EntryKind::Missing, _) => continue,
            (EntryKind::Dir, Some(_)) => continue,
            (_, None) => return TargetStatus::Exists(candidate),
            (EntryKind::File, Some(name)) => {
                if disk.defines_test(&candidate, name) {
                    return TargetStatus::Exists(candidate);
                }
                found_file.get_or_insert(candidate);
            }
        }
    }

    match (found_file, test) {
        (Some(file), Some(test)) => TargetStatus::TestNotFound {
            file,
            test: test.to_string(),
        },
        _ => TargetStatus::Missing,
    }
}
