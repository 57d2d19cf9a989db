//! Programmatic NetCDF fixture builder.
//!
//! Tests describe a small CMIP6-style file (dimensions, coordinate and data
//! variables, attributes) and write it into a temporary directory.

use std::path::{Path, PathBuf};

/// Attribute value attached to a fixture variable.
#[derive(Debug, Clone)]
pub enum NcAttr {
    Text(String),
    Float(f32),
    Double(f64),
}

impl From<&str> for NcAttr {
    fn from(value: &str) -> Self {
        NcAttr::Text(value.to_string())
    }
}

impl From<f32> for NcAttr {
    fn from(value: f32) -> Self {
        NcAttr::Float(value)
    }
}

impl From<f64> for NcAttr {
    fn from(value: f64) -> Self {
        NcAttr::Double(value)
    }
}

#[derive(Debug, Clone)]
enum NcValues {
    F32(Vec<f32>),
    F64(Vec<f64>),
}

#[derive(Debug, Clone)]
struct NcVar {
    name: String,
    dims: Vec<String>,
    values: NcValues,
    attrs: Vec<(String, NcAttr)>,
}

/// Builder for a minimal NetCDF test file.
#[derive(Debug, Clone, Default)]
pub struct NcFixture {
    dims: Vec<(String, usize)>,
    vars: Vec<NcVar>,
}

impl NcFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension.
    pub fn dimension(mut self, name: &str, len: usize) -> Self {
        self.dims.push((name.to_string(), len));
        self
    }

    /// Add a `f64` variable (coordinates, coefficients).
    pub fn coordinate(mut self, name: &str, dims: &[&str], values: Vec<f64>) -> Self {
        self.vars.push(NcVar {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values: NcValues::F64(values),
            attrs: Vec::new(),
        });
        self
    }

    /// Add a `f32` data variable.
    pub fn data(mut self, name: &str, dims: &[&str], values: Vec<f32>) -> Self {
        self.vars.push(NcVar {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values: NcValues::F32(values),
            attrs: Vec::new(),
        });
        self
    }

    /// Attach an attribute to the most recently added variable.
    pub fn attr(mut self, key: &str, value: impl Into<NcAttr>) -> Self {
        let var = self
            .vars
            .last_mut()
            .expect("attr() must follow a variable");
        var.attrs.push((key.to_string(), value.into()));
        self
    }

    /// A `time` dimension and CF time variable.
    pub fn time_axis(self, values: &[f64], units: &str, calendar: &str) -> Self {
        self.dimension("time", values.len())
            .coordinate("time", &["time"], values.to_vec())
            .attr("units", units)
            .attr("calendar", calendar)
    }

    /// `lat`/`lon` dimensions with 1-D coordinate variables.
    pub fn lat_lon(self, lats: &[f64], lons: &[f64]) -> Self {
        self.dimension("lat", lats.len())
            .dimension("lon", lons.len())
            .coordinate("lat", &["lat"], lats.to_vec())
            .attr("units", "degrees_north")
            .coordinate("lon", &["lon"], lons.to_vec())
            .attr("units", "degrees_east")
    }

    /// Write the fixture to `dir/name` and return the path.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = netcdf::create(&path).expect("failed to create NetCDF file");

        for (name, len) in &self.dims {
            file.add_dimension(name, *len).expect("add dimension");
        }

        for var in &self.vars {
            let dims: Vec<&str> = var.dims.iter().map(String::as_str).collect();
            match &var.values {
                NcValues::F32(values) => {
                    let mut nc_var = file
                        .add_variable::<f32>(&var.name, &dims)
                        .expect("add f32 variable");
                    // Attributes first: _FillValue must precede the data.
                    for (key, value) in &var.attrs {
                        put_attr(&mut nc_var, key, value);
                    }
                    nc_var.put_values(values, ..).expect("put f32 values");
                }
                NcValues::F64(values) => {
                    let mut nc_var = file
                        .add_variable::<f64>(&var.name, &dims)
                        .expect("add f64 variable");
                    for (key, value) in &var.attrs {
                        put_attr(&mut nc_var, key, value);
                    }
                    nc_var.put_values(values, ..).expect("put f64 values");
                }
            }
        }

        path
    }
}

fn put_attr(var: &mut netcdf::VariableMut<'_>, key: &str, value: &NcAttr) {
    let result = match value {
        NcAttr::Text(s) => var.put_attribute(key, s.as_str()),
        NcAttr::Float(v) => var.put_attribute(key, *v),
        NcAttr::Double(v) => var.put_attribute(key, *v),
    };
    result.expect("put attribute");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = NcFixture::new()
            .time_axis(&[0.0, 6.0], "hours since 2040-01-01", "noleap")
            .lat_lon(&[-45.0, 45.0], &[0.0, 90.0, 180.0])
            .data("tas", &["time", "lat", "lon"], vec![280.0; 12])
            .attr("units", "K")
            .write(dir.path(), "tas.nc");

        let file = netcdf::open(&path).unwrap();
        let var = file.variable("tas").unwrap();
        assert_eq!(var.dimensions().len(), 3);
        let values = var.get_values::<f32, _>(..).unwrap();
        assert_eq!(values.len(), 12);
    }
}
