//! Hybrid sigma-pressure to pressure level conversion.
//!
//! The pressure of hybrid level `k` at a point is `ps * b[k] + ap[k]`. For
//! each target pressure `p` the converter copies the value of the **last**
//! hybrid level (in file order) whose pressure is still `>= p`, i.e. the
//! native level nearest to but not above the target. No interpolation
//! weight is applied. When no level qualifies (target below the lowest
//! model level) the selection clamps to level 0.

use cmip_common::{Field, PressureLevelSet, VerticalAxis};
use tracing::debug;

use crate::error::{GridProcessorError, Result};

/// Per-level hybrid coefficients `(ap_k, b_k)`, constant for a model run.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridCoefficients {
    ap: Vec<f64>,
    b: Vec<f64>,
}

impl HybridCoefficients {
    /// Build from `ap` (Pa) and `b` (dimensionless); lengths must match.
    pub fn new(ap: Vec<f64>, b: Vec<f64>) -> Result<Self> {
        if ap.is_empty() {
            return Err(GridProcessorError::InvalidCoefficients(
                "no hybrid levels".to_string(),
            ));
        }
        if ap.len() != b.len() {
            return Err(GridProcessorError::shape_mismatch("b", ap.len(), b.len()));
        }
        Ok(Self { ap, b })
    }

    pub fn len(&self) -> usize {
        self.ap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ap.is_empty()
    }

    /// Pressure (Pa) of level `k` over a surface pressure `ps`.
    pub fn pressure_at(&self, k: usize, ps: f64) -> f64 {
        ps * self.b[k] + self.ap[k]
    }
}

/// Index of the last level whose pressure is `>= target`, or 0 if none.
///
/// Ties between levels of equal pressure resolve to the later index.
pub fn select_level<I>(pressures: I, target: f64) -> usize
where
    I: IntoIterator<Item = f64>,
{
    let mut selected = 0;
    for (k, p) in pressures.into_iter().enumerate() {
        if p >= target {
            selected = k;
        }
    }
    selected
}

/// Re-indexes hybrid-level fields onto a pressure level set.
#[derive(Debug, Clone, Copy)]
pub struct HybridToPressure<'a> {
    levels: &'a PressureLevelSet,
}

impl<'a> HybridToPressure<'a> {
    pub fn new(levels: &'a PressureLevelSet) -> Self {
        Self { levels }
    }

    /// Convert `field` (`[level, lat, lon]`) using the coefficients and a
    /// single-layer surface pressure field on the same horizontal grid.
    pub fn convert(
        &self,
        field: &Field,
        coefficients: &HybridCoefficients,
        surface_pressure: &Field,
    ) -> Result<Field> {
        let nz = field.nz();
        if nz != coefficients.len() {
            return Err(GridProcessorError::shape_mismatch(
                format!("{} hybrid levels", field.name),
                coefficients.len(),
                nz,
            ));
        }
        if surface_pressure.nz() != 1 {
            return Err(GridProcessorError::shape_mismatch(
                format!("{} layers", surface_pressure.name),
                1,
                surface_pressure.nz(),
            ));
        }
        let n = field.layer_len();
        if surface_pressure.layer_len() != n {
            return Err(GridProcessorError::shape_mismatch(
                format!("{} horizontal points", surface_pressure.name),
                n,
                surface_pressure.layer_len(),
            ));
        }

        let targets = self.levels.pascals();
        let mut out = vec![f32::NAN; targets.len() * n];
        let mut column = vec![0.0f64; nz];

        for (idx, ps) in surface_pressure.data.iter().enumerate() {
            let ps = *ps as f64;
            for (k, p) in column.iter_mut().enumerate() {
                *p = coefficients.pressure_at(k, ps);
            }
            for (li, target) in targets.iter().enumerate() {
                let k = select_level(column.iter().copied(), *target);
                out[li * n + idx] = field.data[k * n + idx];
            }
        }

        debug!(
            variable = %field.name,
            hybrid_levels = nz,
            pressure_levels = targets.len(),
            "Converted hybrid levels to pressure levels"
        );

        Ok(Field::new(
            field.name.clone(),
            field.units.clone(),
            field.grid.clone(),
            VerticalAxis::Pressure(targets.to_vec()),
            out,
        )?)
    }
}
