//! Hybrid conversion, unit normalization and regridding chained as the
//! converter runs them.

use cmip_common::{CommonMesh, Field, NativeGrid, PressureLevelSet, RunGeometry, VerticalAxis};
use grid_processor::{GridKind, HybridCoefficients, HybridToPressure, Regridder, UnitNormalizer};
use test_utils::{
    assert_all_finite, assert_approx_eq, coarse_global_axes, create_curvilinear_grid,
    create_soil_moisture_grid, pure_pressure_coefficients,
};

fn geometry() -> RunGeometry {
    RunGeometry::new(CommonMesh::global(), PressureLevelSet::standard())
}

#[test]
fn hybrid_field_ends_on_mesh_and_levels() {
    let geometry = geometry();
    let (lats, lons) = coarse_global_axes(9, 18);
    let n = lats.len() * lons.len();
    let grid = NativeGrid::Regular { lats, lons };

    let model_hpa = [1000.0, 700.0, 400.0];
    let (ap, b) = pure_pressure_coefficients(&model_hpa);
    let coefficients = HybridCoefficients::new(ap, b).unwrap();
    let values = [290.0f32, 270.0, 240.0];
    let data = values.iter().flat_map(|v| vec![*v; n]).collect();
    let ta = Field::new("ta", "K", grid.clone(), VerticalAxis::Hybrid { count: 3 }, data).unwrap();
    let ps = Field::new("ps", "Pa", grid, VerticalAxis::Single, vec![101325.0; n]).unwrap();

    let mut field = HybridToPressure::new(&geometry.levels)
        .convert(&ta, &coefficients, &ps)
        .unwrap();
    assert_eq!(UnitNormalizer::new().normalize("ta", &mut field), 0);
    let out = Regridder::new(&geometry).regrid(field, GridKind::Regular).unwrap();

    assert_eq!(out.nz(), geometry.levels.len());
    assert_eq!(out.layer_len(), geometry.mesh.len());
    assert_all_finite!(&out.data);

    // Each target copies the last model level still at or below it.
    for (li, target) in geometry.levels.pascals().iter().enumerate() {
        let k = (0..model_hpa.len())
            .rev()
            .find(|&k| model_hpa[k] * 100.0 >= *target)
            .unwrap_or(0);
        let layer = out.layer(li);
        assert_approx_eq!(layer[0], values[k], 1e-3);
        assert_approx_eq!(layer[layer.len() / 2], values[k], 1e-3);
    }
}

#[test]
fn celsius_ocean_field_is_complete_in_kelvin() {
    let geometry = geometry();
    let grid = create_curvilinear_grid(12, 24);
    let n = 12 * 24;
    // Linear along each row, constant down each column.
    let mut data: Vec<f32> = (0..n).map(|i| 2.0 + 0.5 * (i % 24) as f32).collect();
    for i in (0..n).step_by(7) {
        data[i] = f32::NAN;
    }
    let mut tos = Field::new("tos", "degC", grid, VerticalAxis::Single, data).unwrap();

    assert_eq!(UnitNormalizer::new().normalize("tos", &mut tos), 1);
    assert_eq!(tos.units, "K");
    let out = Regridder::new(&geometry)
        .regrid(tos, GridKind::Curvilinear)
        .unwrap();

    assert_eq!(out.layer_len(), geometry.mesh.len());
    assert!(out.is_complete());
    assert!(out
        .data
        .iter()
        .all(|v| (275.15 - 1e-3..=286.65 + 1e-3).contains(v)));
}

#[test]
fn soil_field_with_ocean_columns_is_filled() {
    let geometry = geometry();
    let (lats, lons) = coarse_global_axes(10, 20);
    let data = create_soil_moisture_grid(10, 20, 4);
    assert!(data.iter().any(|v| v.is_nan()));
    let field = Field::new(
        "mrsos",
        "kg m-2",
        NativeGrid::Regular { lats, lons },
        VerticalAxis::Single,
        data,
    )
    .unwrap();

    let out = Regridder::new(&geometry).regrid(field, GridKind::Soil).unwrap();
    assert_eq!(out.nz(), 1);
    assert!(out.is_complete());
    assert_all_finite!(&out.data);
}
