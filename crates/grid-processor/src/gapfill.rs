//! Filling of missing (NaN) values along one grid axis.
//!
//! Interior gaps are interpolated linearly in the axis coordinate; gaps
//! before the first or after the last valid value are extrapolated from the
//! two nearest valid values. A series with a single valid value is filled
//! with that value; a series with none is left untouched.

/// Fill missing values of `values` in place. Returns how many were filled.
pub fn fill_linear(values: &mut [f32], coords: &[f64]) -> usize {
    debug_assert_eq!(values.len(), coords.len());

    let valid: Vec<usize> = (0..values.len())
        .filter(|&i| values[i].is_finite())
        .collect();
    if valid.is_empty() || valid.len() == values.len() {
        return 0;
    }
    if valid.len() == 1 {
        let only = values[valid[0]];
        let mut filled = 0;
        for v in values.iter_mut().filter(|v| !v.is_finite()) {
            *v = only;
            filled += 1;
        }
        return filled;
    }

    let first = valid[0];
    let last = valid[valid.len() - 1];
    let mut seg = 0;
    let mut filled = 0;

    for i in 0..values.len() {
        if values[i].is_finite() {
            continue;
        }
        let (a, b) = if i < first {
            (valid[0], valid[1])
        } else if i > last {
            (valid[valid.len() - 2], last)
        } else {
            while valid[seg + 1] < i {
                seg += 1;
            }
            (valid[seg], valid[seg + 1])
        };
        values[i] = linear(coords[a], values[a], coords[b], values[b], coords[i]);
        filled += 1;
    }
    filled
}

fn linear(xa: f64, va: f32, xb: f64, vb: f32, x: f64) -> f32 {
    if xb == xa {
        return va;
    }
    let t = (x - xa) / (xb - xa);
    (va as f64 + (vb as f64 - va as f64) * t) as f32
}

/// Fill each row of a `ny x nx` layer along the x axis.
pub fn fill_rows(layer: &mut [f32], nx: usize, x_coords: &[f64]) -> usize {
    layer
        .chunks_mut(nx)
        .map(|row| fill_linear(row, x_coords))
        .sum()
}

/// Fill each column of a `ny x nx` layer along the y axis.
pub fn fill_columns(layer: &mut [f32], nx: usize, y_coords: &[f64]) -> usize {
    let ny = layer.len() / nx;
    let mut column = vec![0.0f32; ny];
    let mut filled = 0;
    for i in 0..nx {
        for j in 0..ny {
            column[j] = layer[j * nx + i];
        }
        let n = fill_linear(&mut column, y_coords);
        if n > 0 {
            for j in 0..ny {
                layer[j * nx + i] = column[j];
            }
            filled += n;
        }
    }
    filled
}

/// Fill every vertical column of an `nz x n` block along the level axis.
pub fn fill_levels(data: &mut [f32], n: usize, level_coords: &[f64]) -> usize {
    let nz = level_coords.len();
    let mut column = vec![0.0f32; nz];
    let mut filled = 0;
    for idx in 0..n {
        for k in 0..nz {
            column[k] = data[k * n + idx];
        }
        let c = fill_linear(&mut column, level_coords);
        if c > 0 {
            for k in 0..nz {
                data[k * n + idx] = column[k];
            }
            filled += c;
        }
    }
    filled
}

/// Index coordinates `0, 1, ..., n-1` for axes without physical coordinates.
pub fn index_coords(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}
