//! Candidate landmark observations built from scan segments.

use serde::{Deserialize, Serialize};

use super::pose::{Point2D, Pose2D};
use crate::core::math::{angle_diff, ccw_contains, normalize_angle};

/// Free-space angular interval adjoining a landmark.
///
/// Runs counter-clockwise from `start` to `end`. Either bound may be
/// undetermined; with both undetermined the sweep carries no information
/// and its owner is a marker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sweep {
    /// CCW start of the free interval.
    pub start: Option<f32>,
    /// CCW end of the free interval.
    pub end: Option<f32>,
}

impl Sweep {
    /// Sweep with no determined bound.
    pub const UNKNOWN: Sweep = Sweep {
        start: None,
        end: None,
    };

    /// Create a sweep from optional bounds.
    #[inline]
    pub fn new(start: Option<f32>, end: Option<f32>) -> Self {
        Self {
            start: start.map(normalize_angle),
            end: end.map(normalize_angle),
        }
    }

    /// True if neither bound is determined.
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// True if both bounds are determined.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Whether `angle` lies in the free interval.
    ///
    /// Only answered when both bounds are known.
    #[inline]
    pub fn contains(&self, angle: f32) -> Option<bool> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(ccw_contains(start, end, angle)),
            _ => None,
        }
    }

    /// Rotate both bounds by `angle`.
    #[inline]
    pub fn rotated(&self, angle: f32) -> Sweep {
        Sweep::new(self.start.map(|a| a + angle), self.end.map(|a| a + angle))
    }

    /// Whether every bound defined on both sides agrees within `tolerance`.
    ///
    /// Bounds undefined on either side are not compared.
    pub fn agrees_with(&self, other: &Sweep, tolerance: f32) -> bool {
        let close = |a: Option<f32>, b: Option<f32>| match (a, b) {
            (Some(a), Some(b)) => angle_diff(a, b).abs() <= tolerance,
            _ => true,
        };
        close(self.start, other.start) && close(self.end, other.end)
    }
}

/// A landmark candidate observed from one scan segment.
///
/// Positional uncertainty is kept in beam coordinates (along / across the
/// beam) so it can be re-expressed under any pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Robot-frame position
    pub local: Point2D,
    /// Robot-frame free-space sweep
    pub local_sweep: Sweep,
    /// World-frame position under the pose used to place it
    pub position: Point2D,
    /// World-frame per-axis standard deviation (meters)
    pub stddev: Point2D,
    /// World-frame free-space sweep
    pub sweep: Sweep,
    /// Measured range (meters)
    pub range: f32,
    /// Along-beam standard deviation (meters)
    pub sigma_along: f32,
    /// Cross-beam standard deviation (meters)
    pub sigma_across: f32,
}

impl Observation {
    /// Build an observation from robot-frame quantities and place it at `pose`.
    pub fn new(
        local: Point2D,
        local_sweep: Sweep,
        sigma_along: f32,
        sigma_across: f32,
        pose: &Pose2D,
    ) -> Self {
        let mut obs = Self {
            local,
            local_sweep,
            position: local,
            stddev: Point2D::default(),
            sweep: local_sweep,
            range: local.length(),
            sigma_along,
            sigma_across,
        };
        obs.place(pose);
        obs
    }

    /// Re-express this observation under a different robot pose.
    #[inline]
    pub fn relocate(&self, pose: &Pose2D) -> Observation {
        let mut obs = *self;
        obs.place(pose);
        obs
    }

    fn place(&mut self, pose: &Pose2D) {
        self.position = pose.transform_point(&self.local);
        self.sweep = self.local_sweep.rotated(pose.theta);

        // Rotate diag(along², across²) into world axes
        let bearing = self.local.angle() + pose.theta;
        let (sin_b, cos_b) = bearing.sin_cos();
        let along2 = self.sigma_along * self.sigma_along;
        let across2 = self.sigma_across * self.sigma_across;
        let var_x = along2 * cos_b * cos_b + across2 * sin_b * sin_b;
        let var_y = along2 * sin_b * sin_b + across2 * cos_b * cos_b;
        self.stddev = Point2D::new(var_x.sqrt(), var_y.sqrt());
    }

    /// True if the sweep carries no information.
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.sweep.is_marker()
    }

    /// Mean per-axis variance.
    #[inline]
    pub fn variance(&self) -> f32 {
        0.5 * (self.stddev.x * self.stddev.x + self.stddev.y * self.stddev.y)
    }
}
