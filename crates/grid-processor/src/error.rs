//! Error types for grid processing.

use cmip_common::CmipError;
use thiserror::Error;

/// Errors that can occur during vertical conversion or regridding.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Array shapes disagree (coefficients vs levels, field vs surface pressure).
    #[error("shape mismatch for '{name}': expected {expected}, got {got}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// The native grid cannot be handled by the requested strategy.
    #[error("invalid grid for '{name}': {reason}")]
    InvalidGrid { name: String, reason: String },

    /// Hybrid coefficients are unusable.
    #[error("invalid hybrid coefficients: {0}")]
    InvalidCoefficients(String),

    /// A field still on model hybrid levels reached the regridder.
    #[error("field '{0}' is on hybrid levels and must be converted to pressure first")]
    UnconvertedHybrid(String),

    /// Missing cells remain after every gap-filling step.
    #[error("field '{name}' has {missing} undefined cells after gap filling")]
    IncompleteField { name: String, missing: usize },

    /// Error from the shared types.
    #[error(transparent)]
    Common(#[from] CmipError),
}

impl GridProcessorError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(name: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected,
            got,
        }
    }

    /// Create an InvalidGrid error.
    pub fn invalid_grid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGrid {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
