//! Error types for NetCDF parsing operations.

use cmip_common::CmipError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Time axis uses a calendar this reader does not decode
    #[error("Unsupported calendar: {0}")]
    UnsupportedCalendar(String),

    /// Time units are not `<unit> since <reference>`
    #[error("Invalid time units: {0}")]
    InvalidTimeUnits(String),

    /// No time steps fall inside the requested window
    #[error("No time steps of '{variable}' between {start} and {end}")]
    EmptyWindow {
        variable: String,
        start: String,
        end: String,
    },

    /// Error raised by the netcdf library
    #[error("NetCDF library error: {0}")]
    Netcdf(#[from] netcdf::Error),

    /// Shape error while assembling a field
    #[error(transparent)]
    Common(#[from] CmipError),
}
