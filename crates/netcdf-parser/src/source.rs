//! A variable's full time series as read from disk.

use chrono::NaiveDateTime;
use cmip_common::{nearest_time_index, CmipError, CmipResult, Field, NativeGrid, VerticalAxis};

use crate::error::{NetCdfError, NetCdfResult};

/// All snapshots of one variable, shaped `[time, level, y, x]`.
///
/// A field without a time axis (`times` empty) holds a single snapshot that
/// is valid at every time.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceField {
    pub name: String,
    pub units: String,
    pub times: Vec<NaiveDateTime>,
    pub grid: NativeGrid,
    pub vertical: VerticalAxis,
    pub data: Vec<f32>,
}

impl SourceField {
    /// Number of values in one snapshot.
    pub fn snapshot_len(&self) -> usize {
        let (ny, nx) = self.grid.shape();
        self.vertical.len() * ny * nx
    }

    /// Number of stored snapshots.
    pub fn snapshot_count(&self) -> usize {
        self.times.len().max(1)
    }

    pub fn is_time_invariant(&self) -> bool {
        self.times.is_empty()
    }

    /// Check that the data length matches times, levels and grid.
    pub fn validate(&self) -> CmipResult<()> {
        self.grid.validate()?;
        let expected = self.snapshot_count() * self.snapshot_len();
        if self.data.len() != expected {
            return Err(CmipError::shape_mismatch(&self.name, expected, self.data.len()));
        }
        Ok(())
    }

    /// The snapshot at time index `idx` as a [`Field`].
    pub fn snapshot(&self, idx: usize) -> CmipResult<Field> {
        let n = self.snapshot_len();
        let start = idx * n;
        let values = self
            .data
            .get(start..start + n)
            .ok_or_else(|| CmipError::shape_mismatch(&self.name, start + n, self.data.len()))?;
        Field::new(
            self.name.clone(),
            self.units.clone(),
            self.grid.clone(),
            self.vertical.clone(),
            values.to_vec(),
        )
    }

    /// The snapshot nearest in time to `t` (earlier one on ties).
    pub fn nearest(&self, t: NaiveDateTime) -> CmipResult<Field> {
        if self.is_time_invariant() {
            return self.snapshot(0);
        }
        let idx = nearest_time_index(&self.times, t)
            .ok_or_else(|| CmipError::EmptySeries(self.name.clone()))?;
        self.snapshot(idx)
    }

    /// Keep only snapshots within `[start, end]` (inclusive).
    ///
    /// Time-invariant fields are returned unchanged. An empty result is an
    /// error.
    pub fn within(self, start: NaiveDateTime, end: NaiveDateTime) -> NetCdfResult<Self> {
        if self.is_time_invariant() {
            return Ok(self);
        }

        let n = self.snapshot_len();
        let mut times = Vec::new();
        let mut data = Vec::new();
        for (idx, t) in self.times.iter().enumerate() {
            if *t >= start && *t <= end {
                times.push(*t);
                data.extend_from_slice(&self.data[idx * n..(idx + 1) * n]);
            }
        }

        if times.is_empty() {
            return Err(NetCdfError::EmptyWindow {
                variable: self.name,
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(Self {
            times,
            data,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2040, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn series() -> SourceField {
        SourceField {
            name: "tas".to_string(),
            units: "K".to_string(),
            times: vec![at(0), at(6), at(12)],
            grid: NativeGrid::Regular {
                lats: vec![0.0],
                lons: vec![0.0, 1.0],
            },
            vertical: VerticalAxis::Single,
            data: vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5],
        }
    }

    #[test]
    fn test_nearest_snapshot() {
        let field = series();
        assert!(field.validate().is_ok());
        assert_eq!(field.nearest(at(5)).unwrap().data, vec![2.0, 2.5]);
        // Equidistant from 00 and 06: the earlier snapshot.
        assert_eq!(field.nearest(at(3)).unwrap().data, vec![1.0, 1.5]);
    }

    #[test]
    fn test_time_invariant_snapshot() {
        let mut field = series();
        field.times.clear();
        field.data.truncate(2);
        assert_eq!(field.nearest(at(18)).unwrap().data, vec![1.0, 1.5]);
    }

    #[test]
    fn test_within_window() {
        let field = series().within(at(6), at(12)).unwrap();
        assert_eq!(field.times, vec![at(6), at(12)]);
        assert_eq!(field.data, vec![2.0, 2.5, 3.0, 3.5]);
    }

    #[test]
    fn test_empty_window_is_error() {
        let err = series().within(at(13), at(23));
        assert!(matches!(err, Err(NetCdfError::EmptyWindow { .. })));
    }
}
