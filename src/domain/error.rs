//! Error types for the preprocessing core.
//!
//! Every variant is raised at the point of detection and propagated
//! with `?`. Nothing here is retried: a run that hits one of these
//! must not leave a usable-looking artifact behind.

use thiserror::Error;

/// Top-level error type for preprocessing operations.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Invalid option values or an unusable training split.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A dev/test record carries a label the training split never had.
    #[error("unknown label '{label}' in record '{id}': not seen in the training split")]
    UnknownLabel { label: String, id: String },

    /// A vector line whose width differs from the first vector line.
    #[error("vector dimension mismatch at line {line}: expected {expected} values, found {found}")]
    DimensionMismatch {
        line:     usize,
        expected: usize,
        found:    usize,
    },

    /// A corpus line that lacks one of the required fields.
    #[error("malformed record at {file}:{line}: {reason}")]
    MalformedRecord {
        file:   String,
        line:   usize,
        reason: String,
    },

    /// The pretrained-vectors source held no vector line at all.
    #[error("no word vectors found in {0}")]
    NoVectors(String),

    /// A persisted artifact breaks an alignment invariant on load.
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    /// Failure to open or read a named input file.
    #[error("cannot read '{path}': {source}")]
    Read {
        path:   String,
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessError>;
