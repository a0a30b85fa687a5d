//! FILENAME: core/pivot-core/src/error.rs
//! Error types for the pivot core.
//!
//! Most failure modes in the pipeline are recoverable and handled locally
//! (dangling field references, unparsable labels, empty configurations).
//! The variants here are the ones surfaced to callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PivotError {
    #[error("{axis} axis has {count} dimensions, at most {max} supported")]
    TooManyAxisDimensions {
        axis: &'static str,
        count: usize,
        max: usize,
    },

    #[error("{count} value dimensions configured, at most {max} supported")]
    TooManyValueDimensions { count: usize, max: usize },

    #[error("Malformed serialized cell: {0}")]
    MalformedCell(#[from] serde_json::Error),

    #[error("Invalid drill path key: {0}")]
    InvalidPathKey(String),
}

pub type PivotResult<T> = Result<T, PivotError>;
