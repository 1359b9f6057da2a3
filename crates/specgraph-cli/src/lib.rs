//! # specgraph-cli: Catalog Validator CLI
//!
//! Provides the `specgraph` command-line interface over
//! [`specgraph_check::Validator`].
//!
//! ## Subcommands
//!
//! - `specgraph validate [ROOT]`: load every markdown file under `ROOT`,
//!   check anchors, footnote test links, authority conflicts, and internal
//!   hyperlinks, and print a text or JSON report.
//!
//! ```bash
//! specgraph validate --check-coverage --authority-conflicts
//! specgraph validate docs/ --format json --exclude 'drafts/**'
//! specgraph -vv validate --strict --jobs 4
//! specgraph validate --validate-syntax --authority-conflicts \
//!     --topic-key keyword --conflict-heuristic level-gap
//! ```
//!
//! Exit codes: `0` clean, `1` validation errors, `2` usage or I/O failure,
//! or interrupted.

pub mod config;
pub mod logging;
pub mod validate;
