//! Test data generators for creating synthetic climate-model fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use cmip_common::NativeGrid;

/// Regular global axes with cell-centred points, like a typical model grid.
///
/// Latitudes run south to north, longitudes start at `-180 + dlon / 2`
/// so callers also exercise longitude normalisation.
pub fn coarse_global_axes(ny: usize, nx: usize) -> (Vec<f64>, Vec<f64>) {
    let dlat = 180.0 / ny as f64;
    let dlon = 360.0 / nx as f64;
    let lats = (0..ny).map(|j| -90.0 + dlat * (j as f64 + 0.5)).collect();
    let lons = (0..nx).map(|i| -180.0 + dlon * (i as f64 + 0.5)).collect();
    (lats, lons)
}

/// Soil moisture-like values (volumetric percent) with NaN over "ocean"
/// columns: every `ocean_every`-th longitude is missing.
pub fn create_soil_moisture_grid(ny: usize, nx: usize, ocean_every: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(ny * nx);
    for row in 0..ny {
        for col in 0..nx {
            if ocean_every > 0 && col % ocean_every == 0 {
                data.push(f32::NAN);
            } else {
                data.push(20.0 + ((row * 7 + col * 3) % 15) as f32);
            }
        }
    }
    data
}

/// A rotated curvilinear grid (`ny x nx`) covering the globe, as a
/// tripolar-like ocean model would store it.
pub fn create_curvilinear_grid(ny: usize, nx: usize) -> NativeGrid {
    let mut lats = Vec::with_capacity(ny * nx);
    let mut lons = Vec::with_capacity(ny * nx);
    for j in 0..ny {
        for i in 0..nx {
            let base_lat = -80.0 + 160.0 * j as f64 / (ny.max(2) - 1) as f64;
            let base_lon = 360.0 * i as f64 / nx as f64;
            // Shear so rows are not lines of constant latitude.
            lats.push(base_lat + 2.0 * (i as f64 / nx as f64));
            lons.push(base_lon + 20.0 + 3.0 * (j as f64 / ny as f64));
        }
    }
    NativeGrid::Curvilinear { lats, lons, ny, nx }
}

/// Hybrid coefficients that reduce to fixed pressures (`b = 0`), given in hPa.
///
/// Returns `(ap, b)` in Pa and dimensionless units.
pub fn pure_pressure_coefficients(levels_hpa: &[f64]) -> (Vec<f64>, Vec<f64>) {
    (
        levels_hpa.iter().map(|p| p * 100.0).collect(),
        vec![0.0; levels_hpa.len()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coarse_global_axes() {
        let (lats, lons) = coarse_global_axes(18, 36);
        assert_eq!(lats[0], -85.0);
        assert_eq!(lats[17], 85.0);
        assert_eq!(lons[0], -175.0);
        assert_eq!(lons[35], 175.0);
    }

    #[test]
    fn test_soil_moisture_grid_has_ocean() {
        let data = create_soil_moisture_grid(2, 4, 2);
        assert!(data[0].is_nan());
        assert!(data[1].is_finite());
        assert!(data[2].is_nan());
    }

    #[test]
    fn test_curvilinear_grid_is_consistent() {
        let grid = create_curvilinear_grid(4, 6);
        assert!(grid.validate().is_ok());
        assert_eq!(grid.shape(), (4, 6));
    }
}
