//! Error types for the check stage.

use thiserror::Error;

use specgraph_scan::ScanError;

/// A validation run that could not produce a report.
#[derive(Error, Debug)]
pub enum CheckError {
    /// Loading or extraction failed fatally.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The report could not be serialized.
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl CheckError {
    /// Whether the run was stopped by the cancellation flag.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Scan(ScanError::Interrupted))
    }
}

/// An option value outside its accepted set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {option} {value:?} (expected one of: {})", expected.join(", "))]
pub struct OptionParseError {
    /// Which option was being parsed.
    pub option: &'static str,
    /// The rejected value.
    pub value: String,
    /// Accepted values.
    pub expected: &'static [&'static str],
}
