#![deny(missing_docs)]

//! # specgraph-scan: Loading and Extraction
//!
//! Turns a directory of markdown files into per-document
//! [`FileExtraction`] records. Nothing here looks across documents; that is
//! the registry's job.
//!
//! ## Pipeline
//!
//! 1. [`DocumentLoader`] enumerates `*.md` files in sorted order, honoring
//!    default and user excludes.
//! 2. [`ExtractionPool`] feeds paths to a fixed number of worker threads.
//! 3. Each worker reads one [`Document`](specgraph_core::Document) and runs
//!    [`extract_document`], which parses the text once with `pulldown-cmark`
//!    and hands the result to the anchor, footnote, and hyperlink extractors.
//!
//! Code blocks (fenced or indented), raw HTML blocks, and inline code spans
//! are invisible to every extractor.

pub mod anchor;
pub mod error;
pub mod extract;
pub mod footnote;
pub mod hyperlink;
pub mod loader;
pub mod markdown;
pub mod pool;

pub use error::ScanError;
pub use extract::{extract_document, FileExtraction};
pub use loader::{DocumentLoader, DEFAULT_EXCLUDED_DIRS};
pub use pool::{default_workers, ExtractionPool, PoolOutput, MAX_DEFAULT_WORKERS};
