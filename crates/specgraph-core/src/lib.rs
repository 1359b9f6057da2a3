#![deny(missing_docs)]

//! # specgraph-core: Foundational Types for the Catalog Validator
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It performs no I/O and has no internal crate dependencies; its only external
//! dependencies are `serde` and `thiserror`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for paths.** Every document location is a
//!    [`DocPath`]: repository-relative, `/`-separated, normalized. Link
//!    targets are resolved through [`DocPath::join_link`] so `./` and `../`
//!    are handled in exactly one place.
//!
//! 2. **Single [`Authority`] enum.** One definition with an explicit
//!    precedence order (`system > platform > feature > none`).
//!
//! 3. **Records are plain data.** [`AnchoredSection`], [`FootnoteDefinition`],
//!    [`FootnoteReference`], and [`Hyperlink`] are produced by extractors and
//!    never mutated afterwards.
//!
//! 4. **Structured errors.** [`LoadError`], [`PathError`], and
//!    [`AuthorityParseError`] are `thiserror` enums. No `Box<dyn Error>`.

pub mod authority;
pub mod document;
pub mod error;
pub mod model;
pub mod path;

pub use authority::Authority;
pub use document::Document;
pub use error::{AuthorityParseError, LoadError, PathError};
pub use model::{
    AnchoredSection, FootnoteDefinition, FootnoteReference, Hyperlink, LinkTarget, ParseWarning,
    ParseWarningKind,
};
pub use path::DocPath;
