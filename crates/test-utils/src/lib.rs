//! Test support for the cmip2wrf workspace: float assertions, synthetic
//! CMIP-like fields, CSV table fixtures and a NetCDF file builder.

pub mod fixtures;
pub mod generators;
pub mod netcdf_fixture;

pub use fixtures::*;
pub use generators::*;
pub use netcdf_fixture::*;

/// Assert `|left - right| <= epsilon`, comparing as f64. NaN never passes.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that every value of a float slice is finite.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_all_finite;
///
/// assert_all_finite!(&field.data);
/// ```
#[macro_export]
macro_rules! assert_all_finite {
    ($values:expr) => {{
        let values: &[f32] = $values;
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            panic!(
                "assertion failed: value at index {} is not finite: `{:?}`",
                pos, values[pos]
            );
        }
    }};
}
