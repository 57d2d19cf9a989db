//! WPS intermediate format (version 5) for cylindrical equidistant grids.
//!
//! Each slab is written as five Fortran sequential records, every record
//! framed by big-endian 4-byte length markers:
//!
//! | # | payload |
//! |---|---------|
//! | 1 | `IFV = 5` (u32) |
//! | 2 | 156-byte header: date, forecast hour, source, field, units, description, level, nx, ny, projection code |
//! | 3 | 28-byte projection: `SWCORNER`, start lat/lon, dlat/dlon, earth radius |
//! | 4 | earth-relative wind flag (u32) |
//! | 5 | `ny x nx` f32 values, latitude-major |
//!
//! All numbers are big-endian on every host.

pub mod error;
pub mod reader;
pub mod record;
pub mod writer;

pub use error::{Result, WrfError};
pub use reader::{read_all, read_file, read_record, read_slab};
pub use record::{LatLonProjection, OutputSlab, IFV, SOURCE_LABEL};
pub use writer::{encode_slab, write_slab, IntermediateFile};
