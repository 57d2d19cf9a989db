//! Grid processing for the CMIP6 to WRF converter.
//!
//! Every source field passes through the same chain before encoding:
//!
//! 1. [`vertical::HybridToPressure`] re-indexes model hybrid levels onto the
//!    target pressure levels (nearest valid level, no weighting).
//! 2. [`units::UnitNormalizer`] applies the closed set of unit corrections.
//! 3. [`regrid::Regridder`] fills gaps and resamples the field onto the
//!    common mesh with a strategy chosen by [`regrid::GridKind`].
//!
//! The result of step 3 is always fully defined over the mesh.

pub mod error;
pub mod gapfill;
pub mod interpolation;
pub mod regrid;
pub mod scatter;
pub mod units;
pub mod vertical;

pub use error::{GridProcessorError, Result};
pub use regrid::{GridKind, Regridder};
pub use scatter::NearestNeighbor;
pub use units::{UnitNormalizer, UnitRule};
pub use vertical::{select_level, HybridCoefficients, HybridToPressure};
