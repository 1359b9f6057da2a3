//! Errors that stop a scan before any document is extracted.

use specgraph_core::LoadError;
use thiserror::Error;

/// Scan-stage failure.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Fatal loading problem (missing root, nothing to validate).
    #[error(transparent)]
    Load(#[from] LoadError),

    /// An `--exclude` pattern is not a valid glob.
    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidExclude {
        /// The rejected pattern.
        pattern: String,
        /// Parser error from `globset`.
        source: globset::Error,
    },

    /// The cancellation flag was raised while workers were running.
    #[error("scan interrupted")]
    Interrupted,
}
