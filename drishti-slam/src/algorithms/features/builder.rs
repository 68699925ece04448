//! Segment → observation conversion.

use serde::{Deserialize, Serialize};

use crate::core::types::{Observation, Pose2D, ScanPoint, Sweep};

/// Configuration for observation uncertainty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Along-beam standard deviation (meters).
    /// Typical: the scanner's distance accuracy.
    pub range_sigma: f32,

    /// Cross-beam standard deviation per meter of range (radians).
    /// Farther points spread more across the beam.
    pub angular_sigma: f32,

    /// Emit marker observations (no known sweep bound) for visualization.
    pub keep_markers: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            range_sigma: 0.03,
            angular_sigma: 0.005,
            keep_markers: true,
        }
    }
}

/// Builds observations from segments under a pose estimate.
///
/// The sweep runs counter-clockwise from the next boundary's direction to
/// the previous boundary's direction, covering the free side of the
/// surface. A bound is only known when its boundary is a discontinuity.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a new builder.
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// One observation per segment, in segment order.
    pub fn build(&self, segments: &[ScanPoint], pose: &Pose2D) -> Vec<Observation> {
        segments
            .iter()
            .map(|segment| self.observe(segment, pose))
            .filter(|obs| self.config.keep_markers || !obs.is_marker())
            .collect()
    }

    /// Observation for a single segment.
    pub fn observe(&self, segment: &ScanPoint, pose: &Pose2D) -> Observation {
        let local_sweep = Sweep::new(
            segment
                .next_discontinuity
                .then_some(segment.average_next_angle),
            segment
                .prev_discontinuity
                .then_some(segment.average_prev_angle),
        );
        let sigma_across = segment.mid_range * self.config.angular_sigma;
        Observation::new(
            segment.local_position(),
            local_sweep,
            self.config.range_sigma,
            sigma_across,
            pose,
        )
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn segment(prev: bool, next: bool) -> ScanPoint {
        ScanPoint {
            angle_width: 0.4,
            start_angle: -0.2,
            end_angle: 0.2,
            average_prev_angle: -FRAC_PI_2,
            average_next_angle: FRAC_PI_2,
            prev_discontinuity: prev,
            next_discontinuity: next,
            first_index: 10,
            last_index: 50,
            reading_count: 41,
            mid_angle: 0.0,
            mid_range: 2.0,
        }
    }

    #[test]
    fn test_position_and_uncertainty() {
        let builder = FeatureBuilder::default();
        let obs = builder.observe(&segment(true, true), &Pose2D::new(1.0, 1.0, 0.0));
        assert_relative_eq!(obs.position.x, 3.0, epsilon = 1e-6);
        assert_relative_eq!(obs.position.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(obs.stddev.x, 0.03, epsilon = 1e-6);
        assert_relative_eq!(obs.stddev.y, 0.01, epsilon = 1e-6);
        assert_relative_eq!(obs.range, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sweep_covers_robot_side() {
        let builder = FeatureBuilder::default();
        let obs = builder.observe(&segment(true, true), &Pose2D::identity());
        // Surface at x = 2, robot at the origin: free space toward -x
        assert_eq!(obs.sweep.contains(PI), Some(true));
        assert_eq!(obs.sweep.contains(0.0), Some(false));
    }

    #[test]
    fn test_sweep_rotates_with_pose() {
        let builder = FeatureBuilder::default();
        let obs = builder.observe(&segment(true, true), &Pose2D::new(0.0, 0.0, FRAC_PI_2));
        assert_relative_eq!(obs.sweep.start.unwrap().abs(), PI, epsilon = 1e-5);
        assert_relative_eq!(obs.sweep.end.unwrap(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_bounds_follow_discontinuities() {
        let builder = FeatureBuilder::default();
        let obs = builder.observe(&segment(false, true), &Pose2D::identity());
        assert!(obs.sweep.start.is_some());
        assert!(obs.sweep.end.is_none());

        let marker = builder.observe(&segment(false, false), &Pose2D::identity());
        assert!(marker.is_marker());
    }

    #[test]
    fn test_markers_can_be_filtered() {
        let segments = [segment(false, false), segment(true, true)];
        let all = FeatureBuilder::default().build(&segments, &Pose2D::identity());
        assert_eq!(all.len(), 2);

        let builder = FeatureBuilder::new(FeatureConfig {
            keep_markers: false,
            ..Default::default()
        });
        let matchable = builder.build(&segments, &Pose2D::identity());
        assert_eq!(matchable.len(), 1);
        assert!(!matchable[0].is_marker());
    }

    #[test]
    fn test_sweep_independent_of_scan_direction() {
        use crate::algorithms::segmentation::Segmenter;
        use crate::core::types::{LaserGeometry, ScanFrame};

        let wall = |geometry: LaserGeometry| {
            let mut ranges: Vec<f32> = (0..geometry.distance_count)
                .map(|i| 2.0 / geometry.angle_at(i).cos())
                .collect();
            ranges[0] = 0.0;
            ranges[geometry.distance_count - 1] = 0.0;
            let frame = ScanFrame::new(&geometry, ranges);
            let segments = Segmenter::default().segment(&frame);
            assert_eq!(segments.len(), 1);
            FeatureBuilder::default().observe(&segments[0], &Pose2D::identity())
        };

        for geometry in [
            LaserGeometry::uniform(101, -0.5, 0.5, 0.1, 10.0),
            LaserGeometry::uniform(101, 0.5, -0.5, 0.1, 10.0),
        ] {
            let obs = wall(geometry);
            assert_eq!(obs.sweep.contains(PI), Some(true));
            assert_eq!(obs.sweep.contains(0.0), Some(false));
            assert_relative_eq!(obs.position.x, 2.0, epsilon = 1e-3);
        }
    }
}
