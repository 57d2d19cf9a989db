//! Integration tests reading CMIP6-style files generated on the fly.

use chrono::{NaiveDate, NaiveDateTime};
use cmip_common::{NativeGrid, VerticalAxis};
use netcdf_parser::{CmipDataset, NetCdfError, VerticalHint};
use tempfile::tempdir;
use test_utils::{assert_approx_eq, NcFixture};

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2040, 1, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[test]
fn reads_regular_field_with_fill_values() {
    let dir = tempdir().unwrap();
    let mut values: Vec<f32> = (0..12).map(|v| 270.0 + v as f32).collect();
    values[1] = 1.0e20;
    values[7] = -999.0;
    let path = NcFixture::new()
        .time_axis(&[0.0, 0.25], "days since 2040-01-01", "noleap")
        .lat_lon(&[-45.0, 45.0], &[0.0, 120.0, 240.0])
        .data("tas", &["time", "lat", "lon"], values)
        .attr("units", "K")
        .attr("_FillValue", -999.0f32)
        .write(dir.path(), "tas.nc");

    let ds = CmipDataset::open(&path).unwrap();
    let field = ds.read_field("tas", VerticalHint::Auto).unwrap();

    assert_eq!(field.units, "K");
    assert_eq!(field.times, vec![at(1, 0), at(1, 6)]);
    assert_eq!(field.vertical, VerticalAxis::Single);
    assert_eq!(
        field.grid,
        NativeGrid::Regular {
            lats: vec![-45.0, 45.0],
            lons: vec![0.0, 120.0, 240.0],
        }
    );
    assert!(field.data[1].is_nan());
    assert!(field.data[7].is_nan());
    assert_eq!(field.data.iter().filter(|v| v.is_nan()).count(), 2);
    assert_eq!(field.data[11], 281.0);
}

#[test]
fn reads_hybrid_levels_and_coefficients() {
    let dir = tempdir().unwrap();
    let path = NcFixture::new()
        .time_axis(&[0.0], "hours since 2040-01-01 00:00:00", "standard")
        .lat_lon(&[0.0], &[0.0, 180.0])
        .dimension("lev", 3)
        .coordinate("lev", &["lev"], vec![0.9, 0.7, 0.5])
        .coordinate("ap", &["lev"], vec![0.0, 20000.0, 30000.0])
        .coordinate("b", &["lev"], vec![0.9, 0.5, 0.2])
        .data("ta", &["time", "lev", "lat", "lon"], vec![280.0; 6])
        .attr("units", "K")
        .write(dir.path(), "ta.nc");

    let ds = CmipDataset::open(&path).unwrap();
    let field = ds.read_field("ta", VerticalHint::Auto).unwrap();
    assert_eq!(field.vertical, VerticalAxis::Hybrid { count: 3 });

    let terms = ds.read_hybrid_terms().unwrap();
    assert_eq!(terms.ap, vec![0.0, 20000.0, 30000.0]);
    assert_eq!(terms.b, vec![0.9, 0.5, 0.2]);
}

#[test]
fn hybrid_terms_from_a_and_p0() {
    let dir = tempdir().unwrap();
    let path = NcFixture::new()
        .dimension("lev", 2)
        .coordinate("a", &["lev"], vec![0.1, 0.2])
        .coordinate("b", &["lev"], vec![0.8, 0.1])
        .dimension("scalar", 1)
        .coordinate("p0", &["scalar"], vec![100000.0])
        .write(dir.path(), "coeffs.nc");

    let terms = CmipDataset::open(&path).unwrap().read_hybrid_terms().unwrap();
    assert_approx_eq!(terms.ap[0], 10000.0, 1e-6);
    assert_approx_eq!(terms.ap[1], 20000.0, 1e-6);
}

#[test]
fn pressure_levels_in_hpa_become_pascals() {
    let dir = tempdir().unwrap();
    let path = NcFixture::new()
        .time_axis(&[0.0], "hours since 2040-01-01", "gregorian")
        .lat_lon(&[0.0], &[0.0])
        .dimension("plev", 2)
        .coordinate("plev", &["plev"], vec![1000.0, 500.0])
        .attr("units", "hPa")
        .data("ua", &["time", "plev", "lat", "lon"], vec![5.0, 10.0])
        .write(dir.path(), "ua.nc");

    let field = CmipDataset::open(&path)
        .unwrap()
        .read_field("ua", VerticalHint::Auto)
        .unwrap();
    assert_eq!(field.vertical, VerticalAxis::Pressure(vec![100000.0, 50000.0]));
}

#[test]
fn soil_depth_axis() {
    let dir = tempdir().unwrap();
    let path = NcFixture::new()
        .time_axis(&[0.0], "hours since 2040-01-01", "noleap")
        .lat_lon(&[0.0], &[0.0])
        .dimension("depth", 4)
        .coordinate("depth", &["depth"], vec![0.05, 0.25, 0.7, 1.5])
        .attr("units", "m")
        .data("tsl", &["time", "depth", "lat", "lon"], vec![280.0, 281.0, 282.0, 283.0])
        .write(dir.path(), "tsl.nc");

    let field = CmipDataset::open(&path)
        .unwrap()
        .read_field("tsl", VerticalHint::Auto)
        .unwrap();
    assert_eq!(field.vertical, VerticalAxis::SoilDepth(vec![0.05, 0.25, 0.7, 1.5]));
}

#[test]
fn curvilinear_ocean_grid() {
    let dir = tempdir().unwrap();
    let path = NcFixture::new()
        .time_axis(&[0.0], "days since 2040-01-01", "noleap")
        .dimension("j", 2)
        .dimension("i", 3)
        .coordinate("latitude", &["j", "i"], vec![-10.0, -9.0, -8.0, 10.0, 11.0, 12.0])
        .coordinate("longitude", &["j", "i"], vec![0.0, 120.0, 240.0, 5.0, 125.0, 245.0])
        .data("tos", &["time", "j", "i"], vec![20.0; 6])
        .attr("units", "degC")
        .write(dir.path(), "tos.nc");

    let field = CmipDataset::open(&path)
        .unwrap()
        .read_field("tos", VerticalHint::Auto)
        .unwrap();
    assert!(field.grid.is_curvilinear());
    assert_eq!(field.grid.shape(), (2, 3));
    assert_eq!(field.units, "degC");
}

#[test]
fn unsupported_calendar_is_rejected() {
    let dir = tempdir().unwrap();
    let path = NcFixture::new()
        .time_axis(&[0.0], "days since 2040-01-01", "360_day")
        .lat_lon(&[0.0], &[0.0])
        .data("tas", &["time", "lat", "lon"], vec![280.0])
        .write(dir.path(), "tas.nc");

    let err = CmipDataset::open(&path)
        .unwrap()
        .read_field("tas", VerticalHint::Auto);
    assert!(matches!(err, Err(NetCdfError::UnsupportedCalendar(_))));
}

#[test]
fn missing_variable_is_reported() {
    let dir = tempdir().unwrap();
    let path = NcFixture::new()
        .lat_lon(&[0.0], &[0.0])
        .write(dir.path(), "empty.nc");

    let err = CmipDataset::open(&path)
        .unwrap()
        .read_field("tas", VerticalHint::Auto);
    assert!(matches!(err, Err(NetCdfError::MissingData(_))));
}
