//! A single snapshot of a variable on its native grid.

use crate::error::{CmipError, CmipResult};
use crate::grid::CommonMesh;

/// Horizontal grid a field is defined on.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeGrid {
    /// Rectilinear grid described by 1-D latitude and longitude axes.
    Regular { lats: Vec<f64>, lons: Vec<f64> },
    /// Curvilinear grid with a (lat, lon) pair per cell, row-major `ny x nx`.
    Curvilinear {
        lats: Vec<f64>,
        lons: Vec<f64>,
        ny: usize,
        nx: usize,
    },
}

impl NativeGrid {
    /// The common mesh expressed as a regular grid.
    pub fn from_mesh(mesh: &CommonMesh) -> Self {
        NativeGrid::Regular {
            lats: mesh.lats().to_vec(),
            lons: mesh.lons().to_vec(),
        }
    }

    /// (ny, nx) of the grid.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            NativeGrid::Regular { lats, lons } => (lats.len(), lons.len()),
            NativeGrid::Curvilinear { ny, nx, .. } => (*ny, *nx),
        }
    }

    pub fn is_curvilinear(&self) -> bool {
        matches!(self, NativeGrid::Curvilinear { .. })
    }

    /// Check coordinate array lengths agree with the declared shape.
    pub fn validate(&self) -> CmipResult<()> {
        match self {
            NativeGrid::Regular { lats, lons } => {
                if lats.is_empty() || lons.is_empty() {
                    return Err(CmipError::InvalidGrid("empty coordinate axis".to_string()));
                }
            }
            NativeGrid::Curvilinear { lats, lons, ny, nx } => {
                let n = ny * nx;
                if n == 0 {
                    return Err(CmipError::InvalidGrid("empty curvilinear grid".to_string()));
                }
                if lats.len() != n {
                    return Err(CmipError::shape_mismatch("latitude", n, lats.len()));
                }
                if lons.len() != n {
                    return Err(CmipError::shape_mismatch("longitude", n, lons.len()));
                }
            }
        }
        Ok(())
    }
}

/// Vertical coordinate of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum VerticalAxis {
    /// No vertical dimension.
    Single,
    /// Model hybrid levels, in file order.
    Hybrid { count: usize },
    /// Pressure levels in Pa.
    Pressure(Vec<f64>),
    /// Soil layer depths (m).
    SoilDepth(Vec<f64>),
}

impl VerticalAxis {
    pub fn len(&self) -> usize {
        match self {
            VerticalAxis::Single => 1,
            VerticalAxis::Hybrid { count } => *count,
            VerticalAxis::Pressure(levels) => levels.len(),
            VerticalAxis::SoilDepth(depths) => depths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Values of one variable at one time, shaped `[nz, ny, nx]` row-major.
///
/// Missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub units: String,
    pub grid: NativeGrid,
    pub vertical: VerticalAxis,
    pub data: Vec<f32>,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        grid: NativeGrid,
        vertical: VerticalAxis,
        data: Vec<f32>,
    ) -> CmipResult<Self> {
        let name = name.into();
        grid.validate()?;
        let (ny, nx) = grid.shape();
        let expected = vertical.len() * ny * nx;
        if data.len() != expected {
            return Err(CmipError::shape_mismatch(name, expected, data.len()));
        }
        Ok(Self {
            name,
            units: units.into(),
            grid,
            vertical,
            data,
        })
    }

    pub fn nz(&self) -> usize {
        self.vertical.len()
    }

    pub fn ny(&self) -> usize {
        self.grid.shape().0
    }

    pub fn nx(&self) -> usize {
        self.grid.shape().1
    }

    /// Number of values in one horizontal layer.
    pub fn layer_len(&self) -> usize {
        self.ny() * self.nx()
    }

    pub fn layer(&self, k: usize) -> &[f32] {
        let n = self.layer_len();
        &self.data[k * n..(k + 1) * n]
    }

    pub fn layer_mut(&mut self, k: usize) -> &mut [f32] {
        let n = self.layer_len();
        &mut self.data[k * n..(k + 1) * n]
    }

    /// Count of missing (non-finite) values.
    pub fn missing_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_finite()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_count() == 0
    }
}
