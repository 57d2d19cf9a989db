//! Resampling of native-grid fields onto the common mesh.

use cmip_common::{CommonMesh, Field, NativeGrid, RunGeometry, VerticalAxis};
use tracing::{debug, warn};

use crate::error::{GridProcessorError, Result};
use crate::gapfill::{fill_columns, fill_levels, fill_rows, index_coords};
use crate::interpolation::{interp_levels, reorder_layer, resample_rectilinear, SortedAxis};
use crate::scatter::{apply_mapping, NearestNeighbor};

/// Regridding strategy, chosen from the variable's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    /// Rectilinear lat/lon grid; linear interpolation with extrapolation.
    Regular,
    /// Rectilinear land-only grid; missing cells are filled along longitude
    /// only, each layer on its own.
    Soil,
    /// Curvilinear ocean grid; gap-filled along both native axes, then
    /// nearest-neighbour resampled.
    Curvilinear,
}

/// Brings fields onto the run's mesh and pressure levels.
#[derive(Debug, Clone, Copy)]
pub struct Regridder<'a> {
    geometry: &'a RunGeometry,
}

impl<'a> Regridder<'a> {
    pub fn new(geometry: &'a RunGeometry) -> Self {
        Self { geometry }
    }

    fn mesh(&self) -> &CommonMesh {
        &self.geometry.mesh
    }

    /// Regrid `field` onto the mesh.
    ///
    /// The returned field lies on the mesh (`NativeGrid::Regular` with the
    /// mesh axes) and contains no missing values. Pressure-level fields are
    /// also interpolated onto the run's pressure levels; single-layer and
    /// soil fields keep their layers.
    pub fn regrid(&self, field: Field, kind: GridKind) -> Result<Field> {
        if matches!(field.vertical, VerticalAxis::Hybrid { .. }) {
            return Err(GridProcessorError::UnconvertedHybrid(field.name));
        }

        let name = field.name.clone();
        let units = field.units.clone();
        let (vertical, data) = match kind {
            GridKind::Regular => self.regrid_rectilinear(field, true)?,
            GridKind::Soil => self.regrid_rectilinear(field, false)?,
            GridKind::Curvilinear => self.regrid_curvilinear(field)?,
        };

        let out = self.ensure_complete(name, units, vertical, data)?;
        debug!(
            variable = %out.name,
            kind = ?kind,
            layers = out.nz(),
            "Regridded field onto common mesh"
        );
        Ok(out)
    }

    fn regrid_rectilinear(
        &self,
        mut field: Field,
        fill_vertical: bool,
    ) -> Result<(VerticalAxis, Vec<f32>)> {
        let (lat_axis, lon_axis) = match &field.grid {
            NativeGrid::Regular { lats, lons } => (SortedAxis::new(lats), SortedAxis::longitude(lons)),
            NativeGrid::Curvilinear { .. } => {
                return Err(GridProcessorError::invalid_grid(
                    &field.name,
                    "curvilinear grids need the curvilinear strategy",
                ))
            }
        };
        if lat_axis.is_empty() || lon_axis.is_empty() {
            return Err(GridProcessorError::invalid_grid(
                &field.name,
                "no finite coordinates",
            ));
        }

        let nx_src = field.nx();
        let n = field.layer_len();
        let vertical_filled = match &field.vertical {
            VerticalAxis::Pressure(levels) | VerticalAxis::SoilDepth(levels)
                if fill_vertical && levels.len() > 1 =>
            {
                let levels = levels.clone();
                fill_levels(&mut field.data, n, &levels)
            }
            _ => 0,
        };

        let mesh = self.mesh();
        let mut data = Vec::with_capacity(field.nz() * mesh.len());
        let mut row_filled = 0;
        for k in 0..field.nz() {
            let mut sorted = reorder_layer(field.layer(k), nx_src, &lat_axis, &lon_axis);
            row_filled += fill_rows(&mut sorted, lon_axis.len(), lon_axis.coords());
            data.extend(resample_rectilinear(&sorted, &lat_axis, &lon_axis, mesh));
        }

        debug!(
            variable = %field.name,
            vertical_filled,
            row_filled,
            "Filled native-grid gaps"
        );

        Ok(self.onto_levels(field.vertical, data))
    }

    fn regrid_curvilinear(&self, mut field: Field) -> Result<(VerticalAxis, Vec<f32>)> {
        let (lats, lons, ny, nx) = match &field.grid {
            NativeGrid::Curvilinear { lats, lons, ny, nx } => (lats.clone(), lons.clone(), *ny, *nx),
            NativeGrid::Regular { lats, lons } => {
                let (ny, nx) = (lats.len(), lons.len());
                let grid_lats = lats.iter().flat_map(|y| std::iter::repeat(*y).take(nx)).collect();
                let grid_lons = (0..ny).flat_map(|_| lons.iter().copied()).collect();
                (grid_lats, grid_lons, ny, nx)
            }
        };

        let i_coords = index_coords(nx);
        let j_coords = index_coords(ny);
        let mut filled = 0;
        for k in 0..field.nz() {
            let layer = field.layer_mut(k);
            filled += fill_rows(layer, nx, &i_coords);
            filled += fill_columns(layer, nx, &j_coords);
        }

        let points: Vec<[f64; 2]> = lons
            .iter()
            .zip(&lats)
            .map(|(x, y)| [x.rem_euclid(360.0), *y])
            .collect();
        let index = NearestNeighbor::with_periodic_longitude(&points);

        let mesh = self.mesh();
        let targets: Vec<[f64; 2]> = mesh
            .lats()
            .iter()
            .flat_map(|y| mesh.lons().iter().map(move |x| [*x, *y]))
            .collect();
        let mapping = index.mapping(&targets);

        let mut data = Vec::with_capacity(field.nz() * mesh.len());
        for k in 0..field.nz() {
            data.extend(apply_mapping(&mapping, field.layer(k)));
        }

        debug!(
            variable = %field.name,
            filled,
            source_points = index.source_len(),
            "Resampled curvilinear field by nearest neighbour"
        );

        Ok(self.onto_levels(field.vertical, data))
    }

    /// Interpolate pressure-level data onto the run's levels; other axes pass through.
    fn onto_levels(&self, vertical: VerticalAxis, data: Vec<f32>) -> (VerticalAxis, Vec<f32>) {
        match vertical {
            VerticalAxis::Pressure(source) => {
                let targets = self.geometry.levels.pascals();
                let data = interp_levels(&data, self.mesh().len(), &source, targets);
                (VerticalAxis::Pressure(targets.to_vec()), data)
            }
            other => (other, data),
        }
    }

    /// Last-resort fill on the mesh itself, then the completeness check.
    fn ensure_complete(
        &self,
        name: String,
        units: String,
        vertical: VerticalAxis,
        data: Vec<f32>,
    ) -> Result<Field> {
        let mesh = self.mesh();
        let mut field = Field::new(name, units, NativeGrid::from_mesh(mesh), vertical, data)?;
        if field.is_complete() {
            return Ok(field);
        }

        for k in 0..field.nz() {
            let layer = field.layer_mut(k);
            fill_rows(layer, mesh.nx(), mesh.lons());
            fill_columns(layer, mesh.nx(), mesh.lats());
        }

        let missing = field.missing_count();
        if missing > 0 {
            warn!(variable = %field.name, missing, "Field is incomplete after gap filling");
            return Err(GridProcessorError::IncompleteField {
                name: field.name,
                missing,
            });
        }
        Ok(field)
    }
}
