//! Native NetCDF reading of CMIP6 model output using the netcdf library.
//!
//! Variables are expected in CMOR layout: an optional leading `time`
//! dimension, at most one vertical dimension, then two horizontal
//! dimensions (`lat, lon` or `j, i`). Horizontal coordinates are found by
//! name, either as 1-D axes (regular grid) or 2-D arrays (curvilinear).

use std::path::{Path, PathBuf};
use std::sync::Once;

use cmip_common::{NativeGrid, VerticalAxis};
use tracing::{debug, warn};

use crate::cf_time::{decode_times, CfCalendar, CfTimeUnits};
use crate::error::{NetCdfError, NetCdfResult};
use crate::source::SourceField;

/// Names probed for the latitude coordinate.
pub const LATITUDE_NAMES: [&str; 3] = ["lat", "latitude", "nav_lat"];

/// Names probed for the longitude coordinate.
pub const LONGITUDE_NAMES: [&str; 3] = ["lon", "longitude", "nav_lon"];

/// Vertical dimension names that denote model hybrid levels.
const HYBRID_DIM_NAMES: [&str; 4] = ["lev", "alev", "alevel", "level"];

/// Magnitude from which values are treated as missing.
pub const MISSING_THRESHOLD: f32 = 1.0e20;

/// Silence HDF5's automatic error printing to stderr.
///
/// Probing optional attributes (`missing_value`, `calendar`, ...) makes
/// the HDF5 C library print diagnostics even though the miss is handled.
/// Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// How to interpret a variable's vertical dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalHint {
    /// Decide from the dimension name and coordinate units.
    Auto,
    /// Model hybrid levels.
    Hybrid,
    /// Pressure levels (coordinate in Pa or hPa).
    Pressure,
}

/// Hybrid sigma-pressure terms as stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridTerms {
    /// `ap` in Pa (or `a * p0`).
    pub ap: Vec<f64>,
    pub b: Vec<f64>,
}

/// An open CMIP6 NetCDF file.
pub struct CmipDataset {
    path: PathBuf,
    file: netcdf::File,
}

impl std::fmt::Debug for CmipDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmipDataset").field("path", &self.path).finish()
    }
}

impl CmipDataset {
    pub fn open(path: impl AsRef<Path>) -> NetCdfResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(NetCdfError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        let file = netcdf::open(&path).map_err(|e| {
            NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Opened NetCDF file");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    fn variable(&self, name: &str) -> NetCdfResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable in {}", name, self.path.display())))
    }

    /// Read a whole variable as `f64` (coordinates, coefficients).
    pub fn read_f64(&self, name: &str) -> NetCdfResult<Vec<f64>> {
        Ok(self.variable(name)?.get_values::<f64, _>(..)?)
    }

    /// Read every snapshot of `name` with missing values masked to NaN.
    pub fn read_field(&self, name: &str, hint: VerticalHint) -> NetCdfResult<SourceField> {
        let var = self.variable(name)?;
        let dims: Vec<(String, usize)> = var
            .dimensions()
            .iter()
            .map(|d| (d.name(), d.len()))
            .collect();

        let has_time = dims.first().map_or(false, |(n, _)| n == "time");
        let rest = if has_time { &dims[1..] } else { &dims[..] };
        if rest.len() < 2 || rest.len() > 3 {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has dimensions {:?}; expected [time,] [level,] y, x",
                name,
                dims.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
            )));
        }
        let (y_dim, x_dim) = (&rest[rest.len() - 2], &rest[rest.len() - 1]);

        let grid = self.read_grid(&y_dim.0, y_dim.1, &x_dim.0, x_dim.1)?;
        let vertical = match rest.len() {
            3 => self.read_vertical(&rest[0].0, rest[0].1, hint)?,
            _ => VerticalAxis::Single,
        };
        let times = if has_time {
            self.read_times()?
        } else {
            Vec::new()
        };

        let raw: Vec<f32> = var.get_values::<f32, _>(..)?;
        let data = mask_values(&var, raw);
        let units = get_text_attr(&var, "units").unwrap_or_default();

        let field = SourceField {
            name: name.to_string(),
            units,
            times,
            grid,
            vertical,
            data,
        };
        field.validate()?;

        debug!(
            variable = %name,
            snapshots = field.snapshot_count(),
            levels = field.vertical.len(),
            curvilinear = field.grid.is_curvilinear(),
            "Read variable"
        );
        Ok(field)
    }

    /// Decode the `time` coordinate.
    pub fn read_times(&self) -> NetCdfResult<Vec<chrono::NaiveDateTime>> {
        let var = self.variable("time")?;
        let units = get_text_attr(&var, "units")
            .ok_or_else(|| NetCdfError::MissingData("time units attribute".to_string()))?;
        let calendar = get_text_attr(&var, "calendar");
        let units = CfTimeUnits::parse(&units)?;
        let calendar = CfCalendar::parse(calendar.as_deref())?;
        let values = var.get_values::<f64, _>(..)?;
        decode_times(&values, &units, calendar)
    }

    /// Read `ap` and `b`, or `a * p0` when `ap` is absent.
    pub fn read_hybrid_terms(&self) -> NetCdfResult<HybridTerms> {
        let b = self.read_f64("b")?;
        let ap = if self.has_variable("ap") {
            self.read_f64("ap")?
        } else if self.has_variable("a") && self.has_variable("p0") {
            let p0 = self
                .read_f64("p0")?
                .first()
                .copied()
                .ok_or_else(|| NetCdfError::MissingData("p0 value".to_string()))?;
            self.read_f64("a")?.into_iter().map(|a| a * p0).collect()
        } else {
            return Err(NetCdfError::MissingData(format!(
                "hybrid coefficients ap (or a and p0) in {}",
                self.path.display()
            )));
        };
        Ok(HybridTerms { ap, b })
    }

    fn read_grid(&self, y_dim: &str, ny: usize, x_dim: &str, nx: usize) -> NetCdfResult<NativeGrid> {
        let lat = self.find_coordinate(&LATITUDE_NAMES, y_dim, y_dim, x_dim)?;
        let lon = self.find_coordinate(&LONGITUDE_NAMES, x_dim, y_dim, x_dim)?;

        match (lat, lon) {
            (Coordinate::Axis(lats), Coordinate::Axis(lons)) => {
                if lats.len() != ny || lons.len() != nx {
                    return Err(NetCdfError::InvalidFormat(format!(
                        "coordinate lengths {}x{} do not match grid {}x{}",
                        lats.len(),
                        lons.len(),
                        ny,
                        nx
                    )));
                }
                Ok(NativeGrid::Regular { lats, lons })
            }
            (Coordinate::Field(lats), Coordinate::Field(lons)) => {
                Ok(NativeGrid::Curvilinear { lats, lons, ny, nx })
            }
            _ => Err(NetCdfError::InvalidFormat(
                "latitude and longitude coordinates differ in rank".to_string(),
            )),
        }
    }

    /// First coordinate among `names` that is either a 1-D axis over
    /// `axis_dim` or a 2-D array over `(y_dim, x_dim)`.
    fn find_coordinate(
        &self,
        names: &[&str],
        axis_dim: &str,
        y_dim: &str,
        x_dim: &str,
    ) -> NetCdfResult<Coordinate> {
        for name in names {
            let Some(var) = self.file.variable(name) else {
                continue;
            };
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            match dims.as_slice() {
                [d] if d == axis_dim => {
                    return Ok(Coordinate::Axis(var.get_values::<f64, _>(..)?));
                }
                [dy, dx] if dy == y_dim && dx == x_dim => {
                    return Ok(Coordinate::Field(var.get_values::<f64, _>(..)?));
                }
                _ => {}
            }
        }
        Err(NetCdfError::MissingData(format!(
            "coordinate {} over ({}, {})",
            names.join("/"),
            y_dim,
            x_dim
        )))
    }

    fn read_vertical(&self, dim: &str, len: usize, hint: VerticalHint) -> NetCdfResult<VerticalAxis> {
        let coord = self.file.variable(dim);
        let units = coord.as_ref().and_then(|v| get_text_attr(v, "units"));
        let pressure_scale = units.as_deref().and_then(pressure_scale);
        let values = || -> NetCdfResult<Vec<f64>> {
            match &coord {
                Some(v) => Ok(v.get_values::<f64, _>(..)?),
                None => Ok((0..len).map(|k| k as f64).collect()),
            }
        };

        let is_pressure = match hint {
            VerticalHint::Pressure => true,
            VerticalHint::Hybrid => false,
            VerticalHint::Auto => dim.starts_with("plev") || pressure_scale.is_some(),
        };
        if is_pressure {
            if coord.is_none() {
                return Err(NetCdfError::MissingData(format!("{} pressure coordinate", dim)));
            }
            let scale = pressure_scale.unwrap_or_else(|| {
                warn!(dimension = %dim, units = ?units, "Pressure coordinate without known units; assuming Pa");
                1.0
            });
            return Ok(VerticalAxis::Pressure(
                values()?.into_iter().map(|p| p * scale).collect(),
            ));
        }

        if hint == VerticalHint::Hybrid || HYBRID_DIM_NAMES.contains(&dim) {
            return Ok(VerticalAxis::Hybrid { count: len });
        }
        Ok(VerticalAxis::SoilDepth(values()?))
    }
}

enum Coordinate {
    Axis(Vec<f64>),
    Field(Vec<f64>),
}

/// Multiplier to Pa for a pressure unit label.
fn pressure_scale(units: &str) -> Option<f64> {
    match units.trim() {
        "Pa" | "pa" => Some(1.0),
        "hPa" | "hpa" | "mbar" | "millibar" | "mb" => Some(100.0),
        _ => None,
    }
}

/// Apply `_FillValue`/`missing_value` masking and packing attributes.
fn mask_values(var: &netcdf::Variable, raw: Vec<f32>) -> Vec<f32> {
    let fill_value = get_f32_attr(var, "_FillValue");
    let missing_value = get_f32_attr(var, "missing_value");
    let scale_factor = get_f32_attr(var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f32_attr(var, "add_offset").unwrap_or(0.0);

    raw.into_iter()
        .map(|v| {
            if Some(v) == fill_value
                || Some(v) == missing_value
                || !v.is_finite()
                || v.abs() >= MISSING_THRESHOLD
            {
                f32::NAN
            } else {
                v * scale_factor + add_offset
            }
        })
        .collect()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get f32 attribute.
fn get_f32_attr(var: &netcdf::Variable, name: &str) -> Option<f32> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f32::try_from(attr_value).ok()
}

/// Helper to get a text attribute.
fn get_text_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    String::try_from(attr_value).ok()
}
