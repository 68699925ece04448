//! Fused landmark entries of the vector map.

use serde::{Deserialize, Serialize};

use super::observation::{Observation, Sweep};
use super::pose::Point2D;
use crate::core::math::{angle_diff, angle_lerp};

/// One bound of a map point's free-space sweep.
///
/// `Conflicted` records that fused observations disagreed on this bound.
/// It reads as unknown and is never overwritten by later evidence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AngleBound {
    /// No observation has determined this bound yet.
    #[default]
    Unknown,
    /// World-frame angle (radians).
    Known(f32),
    /// Observations contradicted each other.
    Conflicted,
}

impl AngleBound {
    /// The bound as an optional angle.
    #[inline]
    pub fn value(&self) -> Option<f32> {
        match self {
            AngleBound::Known(angle) => Some(*angle),
            AngleBound::Unknown | AngleBound::Conflicted => None,
        }
    }

    /// Reconcile this bound with a newly observed one.
    ///
    /// `count` is the number of observations already fused into the owner.
    /// Agreeing angles move toward the new one by `1 / (count + 1)`.
    pub fn reconcile(self, observed: Option<f32>, count: u32, tolerance: f32) -> AngleBound {
        match (self, observed) {
            (AngleBound::Conflicted, _) => AngleBound::Conflicted,
            (bound, None) => bound,
            (AngleBound::Unknown, Some(angle)) => AngleBound::Known(angle),
            (AngleBound::Known(current), Some(angle)) => {
                if angle_diff(current, angle).abs() <= tolerance {
                    let t = 1.0 / (count as f32 + 1.0);
                    AngleBound::Known(angle_lerp(current, angle, t))
                } else {
                    AngleBound::Conflicted
                }
            }
        }
    }
}

impl From<Option<f32>> for AngleBound {
    fn from(value: Option<f32>) -> Self {
        value.map_or(AngleBound::Unknown, AngleBound::Known)
    }
}

/// A persistent landmark built from one or more observations.
///
/// Only ever changed through [`MapPoint::fuse`]; `count` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Stable identifier assigned at insertion
    pub id: u64,
    /// Mean world position (meters)
    pub position: Point2D,
    /// Per-axis positional standard deviation (meters)
    pub stddev: Point2D,
    /// CCW start of the free-space sweep
    pub start_angle: AngleBound,
    /// CCW end of the free-space sweep
    pub end_angle: AngleBound,
    /// Number of fused observations
    pub count: u32,
    /// Per-axis sum of squared deviations from the mean (Welford M2)
    scatter: Point2D,
    /// Per-axis sum of observation variances
    observation_variance: Point2D,
}

impl MapPoint {
    /// Create a map point from its first observation.
    pub fn from_observation(id: u64, obs: &Observation) -> Self {
        Self {
            id,
            position: obs.position,
            stddev: obs.stddev,
            start_angle: obs.sweep.start.into(),
            end_angle: obs.sweep.end.into(),
            count: 1,
            scatter: Point2D::default(),
            observation_variance: Point2D::new(
                obs.stddev.x * obs.stddev.x,
                obs.stddev.y * obs.stddev.y,
            ),
        }
    }

    /// Fold one more observation into this point.
    ///
    /// Position is the running mean, spread combines the sample scatter with
    /// the mean observation variance, both divided by `count`.
    pub fn fuse(&mut self, obs: &Observation, sweep_tolerance: f32) {
        let previous = self.count;
        let n = previous as f32 + 1.0;

        let delta = obs.position - self.position;
        self.position.x += delta.x / n;
        self.position.y += delta.y / n;
        let residual = obs.position - self.position;
        self.scatter.x += delta.x * residual.x;
        self.scatter.y += delta.y * residual.y;

        self.observation_variance.x += obs.stddev.x * obs.stddev.x;
        self.observation_variance.y += obs.stddev.y * obs.stddev.y;

        self.start_angle = self
            .start_angle
            .reconcile(obs.sweep.start, previous, sweep_tolerance);
        self.end_angle = self
            .end_angle
            .reconcile(obs.sweep.end, previous, sweep_tolerance);

        self.count = previous + 1;
        self.stddev = Point2D::new(
            Self::spread(self.scatter.x, self.observation_variance.x, n),
            Self::spread(self.scatter.y, self.observation_variance.y, n),
        );
    }

    #[inline]
    fn spread(scatter: f32, observation_variance: f32, n: f32) -> f32 {
        ((scatter.max(0.0) + observation_variance / n) / n).sqrt()
    }

    /// Free-space sweep with conflicted bounds read as unknown.
    #[inline]
    pub fn sweep(&self) -> Sweep {
        Sweep {
            start: self.start_angle.value(),
            end: self.end_angle.value(),
        }
    }

    /// True if neither sweep bound is known; markers are never match targets.
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.start_angle.value().is_none() && self.end_angle.value().is_none()
    }

    /// Mean per-axis variance.
    #[inline]
    pub fn variance(&self) -> f32 {
        0.5 * (self.stddev.x * self.stddev.x + self.stddev.y * self.stddev.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Pose2D;
    use approx::assert_relative_eq;

    fn observation(x: f32, y: f32, start: Option<f32>, end: Option<f32>) -> Observation {
        Observation::new(
            Point2D::new(x, y),
            Sweep::new(start, end),
            0.03,
            0.02,
            &Pose2D::identity(),
        )
    }

    #[test]
    fn test_identical_fusion_narrows() {
        let obs = observation(2.0, 0.0, Some(0.5), Some(-0.5));
        let mut point = MapPoint::from_observation(7, &obs);
        let mut previous = point.stddev;

        for k in 2..=10 {
            point.fuse(&obs, 0.3);
            assert_eq!(point.count, k);
            assert!(point.stddev.x <= previous.x);
            assert!(point.stddev.y <= previous.y);
            previous = point.stddev;
        }
        assert_relative_eq!(point.position.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(point.position.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(point.stddev.x, 0.03 / 10f32.sqrt(), epsilon = 1e-5);
        assert_eq!(point.start_angle, AngleBound::Known(0.5));
    }

    #[test]
    fn test_running_mean() {
        let mut point = MapPoint::from_observation(0, &observation(1.0, 0.0, None, Some(0.0)));
        point.fuse(&observation(1.2, 0.0, None, Some(0.0)), 0.3);
        point.fuse(&observation(1.4, 0.0, None, Some(0.0)), 0.3);
        assert_relative_eq!(point.position.x, 1.2, epsilon = 1e-6);
        assert!(point.stddev.x > 0.03 / 3f32.sqrt());
    }

    #[test]
    fn test_contradicting_sweeps_become_unknown() {
        let mut point = MapPoint::from_observation(0, &observation(2.0, 0.0, Some(0.5), Some(-0.5)));
        point.fuse(&observation(2.0, 0.0, Some(2.5), Some(-2.5)), 0.3);
        assert_eq!(point.start_angle, AngleBound::Conflicted);
        assert_eq!(point.end_angle, AngleBound::Conflicted);
        assert!(point.is_marker());

        // Conflicts are sticky
        point.fuse(&observation(2.0, 0.0, Some(0.5), Some(-0.5)), 0.3);
        assert!(point.is_marker());
        assert_eq!(point.count, 3);
    }

    #[test]
    fn test_bound_reconciliation() {
        assert_eq!(AngleBound::Unknown.reconcile(Some(1.0), 3, 0.2), AngleBound::Known(1.0));
        assert_eq!(AngleBound::Known(1.0).reconcile(None, 3, 0.2), AngleBound::Known(1.0));
        assert_eq!(AngleBound::Unknown.reconcile(None, 3, 0.2), AngleBound::Unknown);

        let refined = AngleBound::Known(1.0).reconcile(Some(1.1), 1, 0.2);
        assert_relative_eq!(refined.value().unwrap(), 1.05, epsilon = 1e-6);
    }
}
