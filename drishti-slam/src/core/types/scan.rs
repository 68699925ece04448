//! Raw range frames and the segments extracted from them.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::pose::Point2D;
use crate::core::math::normalize_angle;

/// Immutable angular metadata of a range scanner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaserGeometry {
    /// Number of readings per revolution.
    pub distance_count: usize,
    /// Beam angle of the first reading (radians, robot frame).
    pub angle_start: f32,
    /// Angle between consecutive readings (radians, CCW positive).
    pub angle_increment: f32,
    /// Readings below this are invalid (meters).
    pub minimum_distance: f32,
    /// Readings above this are invalid (meters).
    pub maximum_distance: f32,
    /// One-sigma range accuracy (meters).
    pub distance_accuracy: f32,
}

impl LaserGeometry {
    /// Hokuyo UTM-30LX: 1081 beams over 270°, 0.1-30 m, ±30 mm.
    pub fn utm_30lx() -> Self {
        let angle_width = 1.5 * PI;
        let distance_count = 1081;
        Self {
            distance_count,
            angle_start: -0.75 * PI,
            angle_increment: angle_width / (distance_count - 1) as f32,
            minimum_distance: 0.1,
            maximum_distance: 30.0,
            distance_accuracy: 0.03,
        }
    }

    /// Evenly spaced beams covering `[angle_start, angle_end]` inclusive.
    pub fn uniform(
        distance_count: usize,
        angle_start: f32,
        angle_end: f32,
        minimum_distance: f32,
        maximum_distance: f32,
    ) -> Self {
        let steps = distance_count.saturating_sub(1).max(1) as f32;
        Self {
            distance_count,
            angle_start,
            angle_increment: (angle_end - angle_start) / steps,
            minimum_distance,
            maximum_distance,
            distance_accuracy: 0.03,
        }
    }

    /// Beam angle of reading `index`, normalized to [-π, π].
    #[inline]
    pub fn angle_at(&self, index: usize) -> f32 {
        normalize_angle(self.angle_start + index as f32 * self.angle_increment)
    }
}

impl Default for LaserGeometry {
    fn default() -> Self {
        Self::utm_30lx()
    }
}

/// One revolution of polar range readings.
///
/// Readings outside `[minimum_distance, maximum_distance]`, and non-finite
/// readings, are invalid and never contribute to features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFrame {
    /// Beam angle of the first reading (radians)
    pub angle_start: f32,
    /// Angle between consecutive readings (radians)
    pub angle_increment: f32,
    /// Minimum valid range (meters)
    pub minimum_distance: f32,
    /// Maximum valid range (meters)
    pub maximum_distance: f32,
    /// Declared number of readings
    pub distance_count: usize,
    /// Range readings (meters)
    pub ranges: Vec<f32>,
}

impl ScanFrame {
    /// Create a frame from metric ranges.
    pub fn new(geometry: &LaserGeometry, ranges: Vec<f32>) -> Self {
        Self {
            angle_start: geometry.angle_start,
            angle_increment: geometry.angle_increment,
            minimum_distance: geometry.minimum_distance,
            maximum_distance: geometry.maximum_distance,
            distance_count: geometry.distance_count,
            ranges,
        }
    }

    /// Create a frame from raw millimeter readings.
    ///
    /// URG-style scanners report error codes as small integers (< 20 mm),
    /// which fall below any sensible minimum distance and read as invalid.
    pub fn from_millimeters(geometry: &LaserGeometry, millimeters: &[u32]) -> Self {
        let ranges = millimeters.iter().map(|&mm| mm as f32 * 0.001).collect();
        Self::new(geometry, ranges)
    }

    /// Angular metadata of this frame.
    pub fn geometry(&self) -> LaserGeometry {
        LaserGeometry {
            distance_count: self.distance_count,
            angle_start: self.angle_start,
            angle_increment: self.angle_increment,
            minimum_distance: self.minimum_distance,
            maximum_distance: self.maximum_distance,
            distance_accuracy: 0.0,
        }
    }

    /// Number of readings present.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if the frame holds no readings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Beam angle of reading `index`, normalized to [-π, π].
    #[inline]
    pub fn angle_at(&self, index: usize) -> f32 {
        normalize_angle(self.angle_start + index as f32 * self.angle_increment)
    }

    /// Whether a range value lies inside the valid distance band.
    #[inline]
    pub fn is_range_valid(&self, range: f32) -> bool {
        range.is_finite() && range >= self.minimum_distance && range <= self.maximum_distance
    }

    /// Range of reading `index` if it is valid.
    #[inline]
    pub fn valid_range(&self, index: usize) -> Option<f32> {
        self.ranges
            .get(index)
            .copied()
            .filter(|&r| self.is_range_valid(r))
    }

    /// Robot-frame Cartesian position of reading `index` if it is valid.
    #[inline]
    pub fn point_at(&self, index: usize) -> Option<Point2D> {
        self.valid_range(index)
            .map(|r| Point2D::from_polar(r, self.angle_at(index)))
    }

    /// Number of valid readings.
    pub fn valid_count(&self) -> usize {
        self.ranges
            .iter()
            .filter(|&&r| self.is_range_valid(r))
            .count()
    }
}

/// A run of contiguous valid readings between two boundaries.
///
/// Produced by the segmenter and consumed once by the feature builder.
/// Angles are robot-frame. Boundaries are in counter-clockwise order
/// whatever the scan direction: the start boundary is the clockwise edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    /// Angular extent from first to last reading (radians, ≥ 0)
    pub angle_width: f32,
    /// Beam angle of the clockwise edge reading
    pub start_angle: f32,
    /// Beam angle of the counter-clockwise edge reading
    pub end_angle: f32,
    /// Surface direction leaving the segment through its start boundary
    pub average_prev_angle: f32,
    /// Surface direction leaving the segment through its end boundary
    pub average_next_angle: f32,
    /// Range or curvature jump at the start boundary
    pub prev_discontinuity: bool,
    /// Range or curvature jump at the end boundary
    pub next_discontinuity: bool,
    /// Lowest frame index of the segment
    pub first_index: usize,
    /// Highest frame index of the segment (inclusive)
    pub last_index: usize,
    /// Number of readings merged into this segment
    pub reading_count: usize,
    /// Beam angle of the representative (middle) reading
    pub mid_angle: f32,
    /// Range of the representative (middle) reading
    pub mid_range: f32,
}

impl ScanPoint {
    /// True if neither boundary is a discontinuity.
    #[inline]
    pub fn is_enclosed(&self) -> bool {
        !self.prev_discontinuity && !self.next_discontinuity
    }

    /// Robot-frame position of the representative reading.
    #[inline]
    pub fn local_position(&self) -> Point2D {
        Point2D::from_polar(self.mid_range, self.mid_angle)
    }
}
