//! Target geometry: the common horizontal mesh and the pressure level set.

use serde::{Deserialize, Serialize};

use crate::error::{CmipError, CmipResult};

/// Standard target pressure levels (hPa), surface to top.
pub const STANDARD_PRESSURE_LEVELS_HPA: [f64; 14] = [
    1000.0, 925.0, 850.0, 700.0, 600.0, 500.0, 400.0, 300.0, 250.0, 200.0, 150.0, 100.0, 70.0,
    50.0,
];

/// Soil depth band labels (cm, top-bottom), in emission order.
pub const SOIL_BAND_LABELS: [&str; 4] = ["000010", "010040", "040100", "100200"];

/// Level value written for surface and single-layer fields.
pub const SURFACE_LEVEL: f32 = 200100.0;

/// Position of the first soil band label contained in `field_name`.
pub fn soil_band_index(field_name: &str) -> Option<usize> {
    SOIL_BAND_LABELS
        .iter()
        .position(|label| field_name.contains(label))
}

/// The fixed global latitude/longitude mesh every field is resampled onto.
///
/// Latitudes run south to north, longitudes west to east from 0°; data on
/// the mesh is row-major with latitude as the slow axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonMesh {
    lats: Vec<f64>,
    lons: Vec<f64>,
}

impl CommonMesh {
    /// 1° global mesh: 181 latitudes from -90° to 90°, 360 longitudes from 0° to 359°.
    pub fn global() -> Self {
        Self {
            lats: (0..181).map(|j| -90.0 + j as f64).collect(),
            lons: (0..360).map(|i| i as f64).collect(),
        }
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Number of longitudes (grid X size).
    pub fn nx(&self) -> usize {
        self.lons.len()
    }

    /// Number of latitudes (grid Y size).
    pub fn ny(&self) -> usize {
        self.lats.len()
    }

    /// Total number of mesh points.
    pub fn len(&self) -> usize {
        self.nx() * self.ny()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// South-west corner latitude.
    pub fn start_lat(&self) -> f64 {
        self.lats[0]
    }

    /// South-west corner longitude.
    pub fn start_lon(&self) -> f64 {
        self.lons[0]
    }

    pub fn dlat(&self) -> f64 {
        self.lats[1] - self.lats[0]
    }

    pub fn dlon(&self) -> f64 {
        self.lons[1] - self.lons[0]
    }

    /// Flat row-major index of (longitude index, latitude index).
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        j * self.nx() + i
    }
}

impl Default for CommonMesh {
    fn default() -> Self {
        Self::global()
    }
}

/// Ordered set of target pressure levels, stored in Pascals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureLevelSet {
    pascals: Vec<f64>,
}

impl PressureLevelSet {
    /// The 14 standard levels, 1000 hPa down to 50 hPa.
    pub fn standard() -> Self {
        Self {
            pascals: STANDARD_PRESSURE_LEVELS_HPA
                .iter()
                .map(|hpa| hpa * 100.0)
                .collect(),
        }
    }

    /// Build a level set from hPa values; they must be positive and strictly decreasing.
    pub fn from_hpa(levels_hpa: &[f64]) -> CmipResult<Self> {
        if levels_hpa.is_empty() {
            return Err(CmipError::InvalidLevels("level set is empty".to_string()));
        }
        if let Some(bad) = levels_hpa.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
            return Err(CmipError::InvalidLevels(format!(
                "level {} hPa is not a positive pressure",
                bad
            )));
        }
        if levels_hpa.windows(2).any(|w| w[1] >= w[0]) {
            return Err(CmipError::InvalidLevels(
                "levels must be strictly decreasing (surface to top)".to_string(),
            ));
        }
        Ok(Self {
            pascals: levels_hpa.iter().map(|hpa| hpa * 100.0).collect(),
        })
    }

    pub fn pascals(&self) -> &[f64] {
        &self.pascals
    }

    pub fn len(&self) -> usize {
        self.pascals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pascals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.pascals.iter().copied()
    }
}

impl Default for PressureLevelSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Immutable target geometry shared by every component for a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunGeometry {
    pub mesh: CommonMesh,
    pub levels: PressureLevelSet,
}

impl RunGeometry {
    pub fn new(mesh: CommonMesh, levels: PressureLevelSet) -> Self {
        Self { mesh, levels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_mesh_shape() {
        let mesh = CommonMesh::global();
        assert_eq!(mesh.ny(), 181);
        assert_eq!(mesh.nx(), 360);
        assert_eq!(mesh.len(), 181 * 360);
        assert_eq!(mesh.lats()[0], -90.0);
        assert_eq!(mesh.lats()[180], 90.0);
        assert_eq!(mesh.lons()[359], 359.0);
        assert!(mesh.lats().windows(2).all(|w| w[1] > w[0]));
        assert!(mesh.lons().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_flat_index_is_latitude_major() {
        let mesh = CommonMesh::global();
        assert_eq!(mesh.flat_index(0, 1), 360);
        assert_eq!(mesh.flat_index(5, 2), 725);
    }

    #[test]
    fn test_standard_levels() {
        let levels = PressureLevelSet::standard();
        assert_eq!(levels.len(), 14);
        assert_eq!(levels.pascals()[0], 100000.0);
        assert_eq!(levels.pascals()[13], 5000.0);
    }

    #[test]
    fn test_levels_must_decrease() {
        assert!(PressureLevelSet::from_hpa(&[500.0, 850.0]).is_err());
        assert!(PressureLevelSet::from_hpa(&[850.0, 850.0]).is_err());
        assert!(PressureLevelSet::from_hpa(&[]).is_err());
        assert!(PressureLevelSet::from_hpa(&[850.0, -1.0]).is_err());
        assert!(PressureLevelSet::from_hpa(&[850.0, 500.0]).is_ok());
    }

    #[test]
    fn test_soil_band_index() {
        assert_eq!(soil_band_index("SM000010"), Some(0));
        assert_eq!(soil_band_index("ST100200"), Some(3));
        assert_eq!(soil_band_index("SM"), None);
    }
}
