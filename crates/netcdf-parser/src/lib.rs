//! NetCDF access layer for CMIP6 model output.
//!
//! This crate reads the variables a conversion run needs from CMOR-style
//! NetCDF files:
//!
//! - [`CmipDataset::read_field`] returns a [`SourceField`] holding every
//!   time step of a variable on its native grid, with `_FillValue`,
//!   `missing_value` and `>= 1e20` values masked to NaN.
//! - [`CmipDataset::read_hybrid_terms`] returns the hybrid coefficients
//!   (`ap`, `b`) of a model-level file.
//! - [`cf_time`] decodes CF time axes on the standard and 365-day calendars.
//!
//! Requires the system `libnetcdf` and `libhdf5` libraries.

pub mod cf_time;
pub mod error;
pub mod reader;
pub mod source;

pub use cf_time::{decode_times, CfCalendar, CfTimeUnits};
pub use error::{NetCdfError, NetCdfResult};
pub use reader::{silence_hdf5_errors, CmipDataset, HybridTerms, VerticalHint};
pub use source::SourceField;
