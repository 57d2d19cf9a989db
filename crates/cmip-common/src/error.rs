//! Error types shared across the converter crates.

use thiserror::Error;

/// Result type alias using CmipError.
pub type CmipResult<T> = Result<T, CmipError>;

/// Errors raised while building run geometry, fields or time axes.
#[derive(Debug, Error)]
pub enum CmipError {
    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid pressure levels: {0}")]
    InvalidLevels(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Shape mismatch for '{name}': expected {expected} values, got {got}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("No time steps available for '{0}'")]
    EmptySeries(String),
}

impl CmipError {
    pub fn shape_mismatch(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected,
            got,
        }
    }
}
