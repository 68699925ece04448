//! Immutable map snapshots for concurrent readers.

use std::collections::HashMap;

use crate::core::types::{AngleBound, MapPoint, Point2D};

use super::region::RegionKey;

/// Summary counts of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapStats {
    /// Total map points
    pub points: usize,
    /// Points with no known sweep bound
    pub markers: usize,
    /// Points with at least one conflicted bound
    pub conflicted: usize,
    /// Sum of fused observation counts
    pub observations: u64,
}

/// Read-only copy of the vector map.
///
/// Built once per frame and shared behind an `Arc`; never changes after
/// construction. Points are ordered by id. The grid indexes matchable
/// points only; markers are kept in a side list for [`MapSnapshot::query`].
#[derive(Debug, Clone)]
pub struct MapSnapshot {
    points: Vec<MapPoint>,
    cell_size: f32,
    inv_cell_size: f32,
    grid: HashMap<RegionKey, Vec<usize>>,
    markers: Vec<usize>,
}

impl MapSnapshot {
    /// Snapshot of an empty map.
    pub fn empty(cell_size: f32) -> Self {
        Self::build(Vec::new(), cell_size)
    }

    /// Index a set of points on a grid of `cell_size` cells.
    pub fn build(mut points: Vec<MapPoint>, cell_size: f32) -> Self {
        points.sort_by_key(|p| p.id);
        let inv_cell_size = 1.0 / cell_size;

        let mut grid: HashMap<RegionKey, Vec<usize>> = HashMap::new();
        let mut markers = Vec::new();
        for (i, p) in points.iter().enumerate() {
            if p.is_marker() {
                markers.push(i);
                continue;
            }
            grid.entry(RegionKey::containing(p.position, inv_cell_size))
                .or_default()
                .push(i);
        }

        Self {
            points,
            cell_size,
            inv_cell_size,
            grid,
            markers,
        }
    }

    /// Number of map points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the map holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Side of the index cells (meters).
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// All points, ordered by id.
    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    /// Point with the given id.
    pub fn get(&self, id: u64) -> Option<&MapPoint> {
        self.points
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Nearest non-marker point within `radius`.
    ///
    /// Markers are never returned; equal distances resolve to the lower id.
    pub fn nearest_matchable(&self, position: Point2D, radius: f32) -> Option<&MapPoint> {
        let radius2 = radius * radius;
        self.candidates(position, radius)
            .into_iter()
            .map(|p| (p.position.distance_squared(&position), p))
            .filter(|(d2, _)| *d2 <= radius2)
            .min_by(|(da, pa), (db, pb)| da.total_cmp(db).then(pa.id.cmp(&pb.id)))
            .map(|(_, p)| p)
    }

    /// All points (markers included) within `radius`, nearest first.
    pub fn query(&self, position: Point2D, radius: f32) -> Vec<MapPoint> {
        let radius2 = radius * radius;
        let markers = self.markers.iter().map(|&i| &self.points[i]);
        let mut found: Vec<(f32, MapPoint)> = self
            .candidates(position, radius)
            .into_iter()
            .chain(markers)
            .map(|p| (p.position.distance_squared(&position), *p))
            .filter(|(d2, _)| *d2 <= radius2)
            .collect();
        found.sort_by(|(da, pa), (db, pb)| da.total_cmp(db).then(pa.id.cmp(&pb.id)));
        found.into_iter().map(|(_, p)| p).collect()
    }

    /// Matchable points in the grid cells covering `radius`.
    fn candidates(&self, position: Point2D, radius: f32) -> Vec<&MapPoint> {
        if !position.is_finite() || radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let rings = (radius * self.inv_cell_size).ceil();
        let cells = (2.0 * rings + 1.0) * (2.0 * rings + 1.0);
        if !rings.is_finite() || cells > self.grid.len() as f32 {
            return self.points.iter().filter(|p| !p.is_marker()).collect();
        }

        RegionKey::containing(position, self.inv_cell_size)
            .neighbors(rings as i32)
            .filter_map(|key| self.grid.get(&key))
            .flatten()
            .map(|&i| &self.points[i])
            .collect()
    }

    /// Summary counts.
    pub fn stats(&self) -> MapStats {
        let mut stats = MapStats {
            points: self.points.len(),
            ..Default::default()
        };
        for p in &self.points {
            if p.is_marker() {
                stats.markers += 1;
            }
            if p.start_angle == AngleBound::Conflicted || p.end_angle == AngleBound::Conflicted {
                stats.conflicted += 1;
            }
            stats.observations += p.count as u64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Observation, Pose2D, Sweep};

    fn point(id: u64, x: f32, y: f32, sweep: Sweep) -> MapPoint {
        let obs = Observation::new(Point2D::new(x, y), sweep, 0.03, 0.01, &Pose2D::identity());
        MapPoint::from_observation(id, &obs)
    }

    fn known() -> Sweep {
        Sweep::new(Some(1.0), Some(-1.0))
    }

    #[test]
    fn test_nearest_skips_markers() {
        let snapshot = MapSnapshot::build(
            vec![
                point(0, 1.0, 0.0, Sweep::UNKNOWN),
                point(1, 1.1, 0.0, known()),
            ],
            0.15,
        );
        let nearest = snapshot.nearest_matchable(Point2D::new(1.0, 0.0), 0.3).unwrap();
        assert_eq!(nearest.id, 1);
        assert!(snapshot.nearest_matchable(Point2D::new(3.0, 0.0), 0.3).is_none());
    }

    #[test]
    fn test_query_sorted_by_distance() {
        let snapshot = MapSnapshot::build(
            vec![
                point(0, 0.5, 0.0, known()),
                point(1, 0.1, 0.0, Sweep::UNKNOWN),
                point(2, -0.3, 0.0, known()),
                point(3, 5.0, 0.0, known()),
            ],
            0.15,
        );
        let ids: Vec<u64> = snapshot
            .query(Point2D::new(0.0, 0.0), 1.0)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn test_radius_spanning_many_cells() {
        let snapshot = MapSnapshot::build(vec![point(4, 0.9, 0.9, known())], 0.15);
        assert!(snapshot.nearest_matchable(Point2D::new(0.0, 0.0), 1.5).is_some());
        assert!(snapshot.nearest_matchable(Point2D::new(0.0, 0.0), 1.2).is_none());
    }

    #[test]
    fn test_stats_and_lookup() {
        let snapshot = MapSnapshot::build(
            vec![point(2, 0.0, 0.0, known()), point(1, 1.0, 0.0, Sweep::UNKNOWN)],
            0.15,
        );
        assert_eq!(snapshot.points()[0].id, 1);
        assert_eq!(snapshot.get(2).map(|p| p.id), Some(2));
        assert!(snapshot.get(9).is_none());
        let stats = snapshot.stats();
        assert_eq!(stats.points, 2);
        assert_eq!(stats.markers, 1);
        assert_eq!(stats.observations, 2);
    }

    #[test]
    fn test_grid_holds_matchable_points_only() {
        let snapshot = MapSnapshot::build(
            vec![
                point(0, 1.0, 0.0, Sweep::UNKNOWN),
                point(1, 2.0, 0.0, known()),
                point(2, 2.05, 0.0, Sweep::UNKNOWN),
            ],
            0.15,
        );
        let indexed: usize = snapshot.grid.values().map(Vec::len).sum();
        assert_eq!(indexed, 1);
        assert_eq!(snapshot.markers, vec![0, 2]);

        // Markers stay visible to range queries
        let ids: Vec<u64> = snapshot
            .query(Point2D::new(2.0, 0.0), 1.5)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn test_far_query_on_dense_grid() {
        let points = (0..40)
            .map(|i| point(i, 0.2 * i as f32, 0.0, known()))
            .collect();
        let snapshot = MapSnapshot::build(points, 0.15);
        let far = Point2D::new(1.0e30, 1.0e30);
        assert!(snapshot.nearest_matchable(far, 0.3).is_none());
        assert!(snapshot.query(far, 0.3).is_empty());
    }
}
