//! Ray-casting range scanner over wall segments.
//!
//! Produces [`ScanFrame`]s with the same geometry and invalid-reading
//! conventions as the real scanner, for tests and benchmarks.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::core::types::{LaserGeometry, Point2D, Pose2D, ScanFrame};

/// A wall in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSegment {
    /// First endpoint
    pub start: Point2D,
    /// Second endpoint
    pub end: Point2D,
}

impl WallSegment {
    /// Create a wall between two points.
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    /// Distance along a unit ray to this wall, if it is hit.
    pub fn ray_intersection(&self, origin: Point2D, direction: Point2D) -> Option<f32> {
        const PARALLEL_EPSILON: f32 = 1e-9;

        let edge = self.end - self.start;
        let denom = cross(direction, edge);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let w = self.start - origin;
        let t = cross(w, edge) / denom;
        let s = cross(w, direction) / denom;
        (t > 0.0 && (0.0..=1.0).contains(&s)).then_some(t)
    }
}

#[inline]
fn cross(a: Point2D, b: Point2D) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Simulated scanner.
///
/// Beams that hit nothing report 0, which is below any minimum distance
/// and reads as invalid.
pub struct SimulatedLidar {
    geometry: LaserGeometry,
    walls: Vec<WallSegment>,
    range_stddev: f32,
    rng: StdRng,
}

impl SimulatedLidar {
    /// Create a noiseless scanner over `walls`.
    pub fn new(geometry: LaserGeometry, walls: Vec<WallSegment>) -> Self {
        Self {
            geometry,
            walls,
            range_stddev: 0.0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Add Gaussian range noise.
    ///
    /// A seed of 0 draws from OS entropy.
    pub fn with_noise(mut self, range_stddev: f32, seed: u64) -> Self {
        self.range_stddev = range_stddev;
        self.rng = if seed == 0 {
            StdRng::from_os_rng()
        } else {
            StdRng::seed_from_u64(seed)
        };
        self
    }

    /// Scanner geometry.
    pub fn geometry(&self) -> &LaserGeometry {
        &self.geometry
    }

    /// True range along one beam, before noise.
    pub fn cast(&self, origin: Point2D, world_angle: f32) -> Option<f32> {
        let (sin_a, cos_a) = world_angle.sin_cos();
        let direction = Point2D::new(cos_a, sin_a);
        self.walls
            .iter()
            .filter_map(|wall| wall.ray_intersection(origin, direction))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Produce one frame as seen from `pose`.
    pub fn scan(&mut self, pose: &Pose2D) -> ScanFrame {
        let origin = pose.position();
        let mut ranges = Vec::with_capacity(self.geometry.distance_count);

        for i in 0..self.geometry.distance_count {
            let world_angle = pose.theta + self.geometry.angle_at(i);
            let range = match self.cast(origin, world_angle) {
                Some(distance) if distance <= self.geometry.maximum_distance => {
                    if self.range_stddev > 0.0 {
                        let n: f32 = self.rng.sample(StandardNormal);
                        distance + n * self.range_stddev
                    } else {
                        distance
                    }
                }
                _ => 0.0,
            };
            ranges.push(range);
        }

        ScanFrame::new(&self.geometry, ranges)
    }
}
