//! Common types shared by every stage of the CMIP6 to WRF conversion.
//!
//! The target geometry (`CommonMesh`, `PressureLevelSet`) is built once at
//! startup and handed to each component by reference; nothing in here is
//! mutated after construction.

pub mod error;
pub mod field;
pub mod grid;
pub mod time;

pub use error::{CmipError, CmipResult};
pub use field::{Field, NativeGrid, VerticalAxis};
pub use grid::{
    soil_band_index, CommonMesh, PressureLevelSet, RunGeometry, SOIL_BAND_LABELS,
    STANDARD_PRESSURE_LEVELS_HPA, SURFACE_LEVEL,
};
pub use time::{
    file_stamp, hdate, nearest_time_index, parse_etl_timestamp, Frequency, TimeSeries,
};
