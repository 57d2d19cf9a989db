//! Error types for intermediate file encoding and decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing or reading intermediate files.
#[derive(Error, Debug)]
pub enum WrfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Slab payload length disagrees with the declared grid size.
    #[error("slab '{field}' has {got} values, expected {expected}")]
    SlabShape {
        field: String,
        expected: usize,
        got: usize,
    },

    /// A record does not follow the expected layout.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Moving the finished temporary file into place failed.
    #[error("failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WrfError {
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }
}

/// Result type for intermediate file operations.
pub type Result<T> = std::result::Result<T, WrfError>;
