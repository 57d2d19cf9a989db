//! Error types for the conversion crate.

use std::path::PathBuf;

use cmip_common::CmipError;
use grid_processor::GridProcessorError;
use netcdf_parser::NetCdfError;
use thiserror::Error;
use wrf_intermediate::WrfError;

/// How a failure affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration, metadata or tables, or a missing input file.
    Configuration,
    /// Source data that cannot be converted.
    Data,
    /// Failure writing output files.
    Output,
}

/// Errors that can occur during a conversion run.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Invalid scenario: {scenario} for model {model}")]
    InvalidScenario { model: String, scenario: String },

    #[error("Required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read table {}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid table {}: {reason}", path.display())]
    InvalidTable { path: PathBuf, reason: String },

    #[error("Variable {variable} not found in {}", path.display())]
    MissingVariable { variable: String, path: PathBuf },

    #[error("Variable {0} was not loaded")]
    NotLoaded(String),

    #[error("Variable {0} is on hybrid levels but no hybrid coefficients were loaded")]
    MissingHybridInputs(String),

    #[error("Variable {variable} cannot be emitted: {reason}")]
    UnexpectedShape { variable: String, reason: String },

    #[error("Failed to read NetCDF data: {0}")]
    NetCdf(#[from] NetCdfError),

    #[error("Failed to process grid: {0}")]
    Grid(#[from] GridProcessorError),

    #[error(transparent)]
    Common(#[from] CmipError),

    #[error("Failed to write intermediate file: {0}")]
    Output(#[from] WrfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    pub fn config(msg: impl Into<String>) -> Self {
        ConversionError::InvalidConfig(msg.into())
    }

    pub fn unexpected_shape(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        ConversionError::UnexpectedShape {
            variable: variable.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::InvalidConfig(_)
            | ConversionError::ConfigParse(_)
            | ConversionError::InvalidScenario { .. }
            | ConversionError::MissingFile(_)
            | ConversionError::Table { .. }
            | ConversionError::InvalidTable { .. } => ErrorKind::Configuration,
            ConversionError::MissingVariable { .. }
            | ConversionError::NotLoaded(_)
            | ConversionError::MissingHybridInputs(_)
            | ConversionError::UnexpectedShape { .. }
            | ConversionError::NetCdf(_)
            | ConversionError::Grid(_)
            | ConversionError::Common(_) => ErrorKind::Data,
            ConversionError::Output(_) | ConversionError::Io(_) => ErrorKind::Output,
        }
    }
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;
