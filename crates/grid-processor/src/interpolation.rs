//! Linear interpolation on rectilinear axes.
//!
//! All routines work on flat row-major `f32` buffers. Axes are sorted
//! ascending before use; targets outside an axis are extrapolated from the
//! two outermost points.

use cmip_common::CommonMesh;

/// A coordinate axis sorted ascending, remembering where each sorted point
/// came from in the source array.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedAxis {
    coords: Vec<f64>,
    order: Vec<usize>,
}

impl SortedAxis {
    /// Sort `raw` ascending. Non-finite coordinates are dropped and
    /// duplicates keep their first occurrence.
    pub fn new(raw: &[f64]) -> Self {
        Self::with_transform(raw, |x| x)
    }

    /// Longitude axis normalised to `[0, 360)` before sorting.
    pub fn longitude(raw: &[f64]) -> Self {
        Self::with_transform(raw, |x| x.rem_euclid(360.0))
    }

    fn with_transform(raw: &[f64], f: impl Fn(f64) -> f64) -> Self {
        let mut pairs: Vec<(f64, usize)> = raw
            .iter()
            .enumerate()
            .filter(|(_, x)| x.is_finite())
            .map(|(i, x)| (f(*x), i))
            .collect();
        // Stable: equal coordinates stay in source order.
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        pairs.dedup_by(|b, a| a.0 == b.0);

        let (coords, order) = pairs.into_iter().unzip();
        Self { coords, order }
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Source index of each sorted coordinate.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Bracket `x` on an ascending axis: returns `(i0, t)` such that the
/// interpolated value is `v[i0] + (v[i0 + 1] - v[i0]) * t`.
///
/// `t` falls outside `[0, 1]` when `x` is off either end. For a
/// single-point axis the result is `(0, 0.0)`.
pub fn locate(axis: &[f64], x: f64) -> (usize, f64) {
    let n = axis.len();
    if n < 2 {
        return (0, 0.0);
    }
    let upper = axis.partition_point(|a| *a <= x);
    let i0 = upper.saturating_sub(1).min(n - 2);
    let span = axis[i0 + 1] - axis[i0];
    let t = if span == 0.0 { 0.0 } else { (x - axis[i0]) / span };
    (i0, t)
}

/// Linear blend of `a` and `b`, exact at both endpoints.
#[inline]
pub fn lerp(a: f32, b: f32, t: f64) -> f32 {
    if t == 0.0 {
        a
    } else if t == 1.0 {
        b
    } else {
        (a as f64 + (b as f64 - a as f64) * t) as f32
    }
}

/// Interpolate `values` (on ascending `axis`) at `x`.
pub fn interp1d(axis: &[f64], values: &[f32], x: f64) -> f32 {
    if values.len() < 2 {
        return values.first().copied().unwrap_or(f32::NAN);
    }
    let (i0, t) = locate(axis, x);
    lerp(values[i0], values[i0 + 1], t)
}

/// Reorder a `ny x nx` layer so rows follow `lat.order()` and columns
/// follow `lon.order()`.
pub fn reorder_layer(layer: &[f32], nx_src: usize, lat: &SortedAxis, lon: &SortedAxis) -> Vec<f32> {
    let mut out = Vec::with_capacity(lat.len() * lon.len());
    for &j in lat.order() {
        let row = &layer[j * nx_src..(j + 1) * nx_src];
        out.extend(lon.order().iter().map(|&i| row[i]));
    }
    out
}

/// Bilinear resampling of a rectilinear layer onto the mesh.
///
/// `layer` must already be ordered like the sorted axes (see
/// [`reorder_layer`]).
pub fn resample_rectilinear(
    layer: &[f32],
    lat: &SortedAxis,
    lon: &SortedAxis,
    mesh: &CommonMesh,
) -> Vec<f32> {
    let nx_src = lon.len();
    let x_brackets: Vec<(usize, f64)> = mesh.lons().iter().map(|x| locate(lon.coords(), *x)).collect();
    let single_x = nx_src < 2;
    let single_y = lat.len() < 2;

    let mut output = Vec::with_capacity(mesh.len());
    for y in mesh.lats() {
        let (j0, ty) = locate(lat.coords(), *y);
        let j1 = if single_y { j0 } else { j0 + 1 };
        let row0 = &layer[j0 * nx_src..(j0 + 1) * nx_src];
        let row1 = &layer[j1 * nx_src..(j1 + 1) * nx_src];

        for &(i0, tx) in &x_brackets {
            let i1 = if single_x { i0 } else { i0 + 1 };
            let bottom = lerp(row0[i0], row0[i1], tx);
            let top = lerp(row1[i0], row1[i1], tx);
            output.push(lerp(bottom, top, ty));
        }
    }
    output
}

/// Interpolate an `nz x n` block from `source` levels onto `targets`,
/// linear in pressure with extrapolation.
pub fn interp_levels(data: &[f32], n: usize, source: &[f64], targets: &[f64]) -> Vec<f32> {
    let axis = SortedAxis::new(source);
    let mut out = vec![f32::NAN; targets.len() * n];
    let mut column = vec![0.0f32; axis.len()];

    for idx in 0..n {
        for (slot, &k) in column.iter_mut().zip(axis.order()) {
            *slot = data[k * n + idx];
        }
        for (li, target) in targets.iter().enumerate() {
            out[li * n + idx] = interp1d(axis.coords(), &column, *target);
        }
    }
    out
}
