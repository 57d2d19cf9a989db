//! Slab and projection types plus the fixed record layout constants.

use chrono::NaiveDateTime;
use cmip_common::{CommonMesh, SURFACE_LEVEL};

/// Format version written in the first record of every slab.
pub const IFV: u32 = 5;

/// Projection code for a cylindrical equidistant (lat/lon) grid.
pub const PROJECTION_LATLON: i32 = 0;

/// Source label written in every header.
pub const SOURCE_LABEL: &str = "CMIP6";

/// Earth radius (km) written in the projection block.
pub const EARTH_RADIUS_KM: f32 = 6371.229;

/// Reference point of the projection block.
pub const START_LOCATION: &str = "SWCORNER";

/// Fixed string widths of the header record.
pub const HDATE_LEN: usize = 24;
pub const MAP_SOURCE_LEN: usize = 32;
pub const FIELD_LEN: usize = 9;
pub const UNITS_LEN: usize = 25;
pub const DESC_LEN: usize = 46;
pub const START_LOCATION_LEN: usize = 8;

/// Byte length of the header record payload.
pub const HEADER_LEN: usize =
    HDATE_LEN + 4 + MAP_SOURCE_LEN + FIELD_LEN + UNITS_LEN + DESC_LEN + 4 + 4 + 4 + 4;

/// Byte length of the lat/lon projection record payload.
pub const PROJECTION_LEN: usize = START_LOCATION_LEN + 5 * 4;

/// Lat/lon projection block.
#[derive(Debug, Clone, PartialEq)]
pub struct LatLonProjection {
    pub start_lat: f32,
    pub start_lon: f32,
    pub dlat: f32,
    pub dlon: f32,
    pub earth_radius: f32,
}

impl LatLonProjection {
    /// Projection of the common mesh, anchored at its south-west corner.
    pub fn from_mesh(mesh: &CommonMesh) -> Self {
        Self {
            start_lat: mesh.start_lat() as f32,
            start_lon: mesh.start_lon() as f32,
            dlat: mesh.dlat() as f32,
            dlon: mesh.dlon() as f32,
            earth_radius: EARTH_RADIUS_KM,
        }
    }
}

/// One labelled 2-D slab: everything the five records of a slab carry.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSlab {
    pub valid_time: NaiveDateTime,
    /// Forecast offset in hours; 0 for model output.
    pub forecast_hours: f32,
    pub source: String,
    pub field: String,
    pub units: String,
    pub description: String,
    /// Pressure in Pa, or [`SURFACE_LEVEL`] for single-layer fields.
    pub level: f32,
    pub nx: usize,
    pub ny: usize,
    pub projection: LatLonProjection,
    pub earth_relative_winds: bool,
    /// `ny x nx` values, latitude-major.
    pub data: Vec<f32>,
}

impl OutputSlab {
    /// A slab on `mesh` with the fixed CMIP6 labelling.
    pub fn on_mesh(
        mesh: &CommonMesh,
        valid_time: NaiveDateTime,
        field: impl Into<String>,
        units: impl Into<String>,
        description: impl Into<String>,
        level: f32,
        data: Vec<f32>,
    ) -> Self {
        Self {
            valid_time,
            forecast_hours: 0.0,
            source: SOURCE_LABEL.to_string(),
            field: field.into(),
            units: units.into(),
            description: description.into(),
            level,
            nx: mesh.nx(),
            ny: mesh.ny(),
            projection: LatLonProjection::from_mesh(mesh),
            earth_relative_winds: false,
            data,
        }
    }

    pub fn is_surface(&self) -> bool {
        self.level == SURFACE_LEVEL
    }
}

/// Space-pad (or truncate) `s` to exactly `width` bytes.
pub fn pad_string(s: &str, width: usize) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(width);
    for ch in s.chars() {
        let mut buf = [0u8; 4];
        let encoded = ch.encode_utf8(&mut buf).as_bytes();
        if out.len() + encoded.len() > width {
            break;
        }
        out.extend_from_slice(encoded);
    }
    out.resize(width, b' ');
    out
}

/// Inverse of [`pad_string`]: drop trailing blanks.
pub fn unpad_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(HEADER_LEN, 156);
        assert_eq!(PROJECTION_LEN, 28);
    }

    #[test]
    fn test_pad_string() {
        assert_eq!(pad_string("TT", 4), b"TT  ".to_vec());
        assert_eq!(pad_string("SOILMOIST", 4), b"SOIL".to_vec());
        assert_eq!(pad_string("", 2), b"  ".to_vec());
        // Multi-byte characters are never split.
        assert_eq!(pad_string("a°", 2), b"a ".to_vec());
    }

    #[test]
    fn test_unpad_string() {
        assert_eq!(unpad_string(b"K        "), "K");
        assert_eq!(unpad_string(b"   "), "");
    }

    #[test]
    fn test_projection_from_global_mesh() {
        let p = LatLonProjection::from_mesh(&CommonMesh::global());
        assert_eq!(p.start_lat, -90.0);
        assert_eq!(p.start_lon, 0.0);
        assert_eq!(p.dlat, 1.0);
        assert_eq!(p.dlon, 1.0);
        assert_eq!(p.earth_radius, 6371.229);
    }
}
