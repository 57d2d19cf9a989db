//! Nearest-neighbour resampling of scattered (lon, lat) points.
//!
//! Distances are plain Euclidean distances in degrees. When several source
//! points are equally close to a target, the one with the lowest source
//! index wins, so results never depend on R-tree insertion order.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// One source point in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScatterPoint {
    position: [f64; 2],
    index: usize,
}

impl RTreeObject for ScatterPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for ScatterPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Nearest-neighbour lookup over a fixed set of source points.
pub struct NearestNeighbor {
    tree: RTree<ScatterPoint>,
    source_len: usize,
}

impl NearestNeighbor {
    /// Index `points` given as `[x, y]`. Points with a non-finite
    /// coordinate are never returned.
    pub fn new(points: &[[f64; 2]]) -> Self {
        Self::build(points, &[0.0])
    }

    /// Like [`NearestNeighbor::new`] for `[lon, lat]` points, with copies
    /// shifted by ±360° so lookups near the date line see both sides.
    pub fn with_periodic_longitude(points: &[[f64; 2]]) -> Self {
        Self::build(points, &[0.0, -360.0, 360.0])
    }

    fn build(points: &[[f64; 2]], shifts: &[f64]) -> Self {
        let entries: Vec<ScatterPoint> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p[0].is_finite() && p[1].is_finite())
            .flat_map(|(index, p)| {
                shifts.iter().map(move |shift| ScatterPoint {
                    position: [p[0] + shift, p[1]],
                    index,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            source_len: points.len(),
        }
    }

    /// Number of source points the index was built from.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Source index nearest to `(x, y)`, lowest index on ties.
    pub fn nearest(&self, x: f64, y: f64) -> Option<usize> {
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&[x, y]);
        let (first, best) = candidates.next()?;
        let mut chosen = first.index;
        for (point, d2) in candidates {
            if d2 > best {
                break;
            }
            chosen = chosen.min(point.index);
        }
        Some(chosen)
    }

    /// Nearest source index for every target, in target order.
    pub fn mapping(&self, targets: &[[f64; 2]]) -> Vec<Option<usize>> {
        targets.iter().map(|t| self.nearest(t[0], t[1])).collect()
    }
}

/// Apply a mapping from [`NearestNeighbor::mapping`] to one layer of values.
pub fn apply_mapping(mapping: &[Option<usize>], values: &[f32]) -> Vec<f32> {
    mapping
        .iter()
        .map(|m| m.map_or(f32::NAN, |i| values[i]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_basic() {
        let index = NearestNeighbor::new(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]]);
        assert_eq!(index.nearest(1.0, 1.0), Some(0));
        assert_eq!(index.nearest(9.0, 2.0), Some(1));
        assert_eq!(index.nearest(-3.0, 8.0), Some(2));
    }

    #[test]
    fn test_equidistant_targets_pick_lowest_index() {
        let points = [[0.0, 0.0], [2.0, 0.0]];
        let values = [1.0, 2.0];
        let mapping = NearestNeighbor::new(&points).mapping(&[[1.0, 1.0], [1.0, -1.0]]);
        let out = apply_mapping(&mapping, &values);
        assert_eq!(out, vec![1.0, 1.0]);
    }

    #[test]
    fn test_tie_ignores_point_order() {
        let points = [[2.0, 0.0], [0.0, 0.0]];
        let index = NearestNeighbor::new(&points);
        assert_eq!(index.nearest(1.0, 0.0), Some(0));
    }

    #[test]
    fn test_periodic_longitude() {
        let points = [[359.5, 0.0], [180.0, 0.0]];
        let plain = NearestNeighbor::new(&points);
        let periodic = NearestNeighbor::with_periodic_longitude(&points);
        assert_eq!(plain.nearest(0.0, 0.0), Some(1));
        assert_eq!(periodic.nearest(0.0, 0.0), Some(0));
    }

    #[test]
    fn test_non_finite_points_skipped() {
        let index = NearestNeighbor::new(&[[f64::NAN, 0.0], [5.0, 5.0]]);
        assert_eq!(index.source_len(), 2);
        assert_eq!(index.nearest(0.0, 0.0), Some(1));
        assert_eq!(NearestNeighbor::new(&[]).nearest(0.0, 0.0), None);
    }
}
