//! Wheel odometry from encoder ticks.
//!
//! Converts differential drive encoder readings into robot-frame pose
//! deltas, and keeps a dead-reckoned pose alongside.

use serde::{Deserialize, Serialize};

use crate::core::types::{OdometryDelta, Pose2D};

/// Configuration for wheel odometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelOdometryConfig {
    /// Wheel travel per encoder tick in meters.
    pub meters_per_tick: f32,

    /// Distance between wheel contact points in meters.
    pub base_width: f32,
}

impl Default for WheelOdometryConfig {
    fn default() -> Self {
        Self {
            meters_per_tick: 0.000_348_342_86,
            base_width: 0.4572,
        }
    }
}

/// Wheel odometry calculator.
///
/// Takes cumulative 32-bit encoder counts; wraparound is handled by
/// wrapping subtraction.
///
/// The delta is expressed in the robot frame at the start of the motion:
/// - x = forward
/// - y = left
/// - theta = counter-clockwise rotation
#[derive(Debug)]
pub struct WheelOdometry {
    config: WheelOdometryConfig,
    last_ticks: Option<(i32, i32)>,
    pose: Pose2D,
}

impl WheelOdometry {
    /// Create a new wheel odometry calculator.
    pub fn new(config: WheelOdometryConfig) -> Self {
        Self {
            config,
            last_ticks: None,
            pose: Pose2D::identity(),
        }
    }

    /// Update with cumulative encoder counts.
    ///
    /// Returns `None` on the first call (initializes state).
    pub fn update(&mut self, left: i32, right: i32) -> Option<OdometryDelta> {
        let delta = self.last_ticks.map(|(prev_left, prev_right)| {
            self.delta_from_ticks(left.wrapping_sub(prev_left), right.wrapping_sub(prev_right))
        });
        self.last_ticks = Some((left, right));

        if let Some(d) = delta {
            self.pose = self.pose.compose(&d);
        }
        delta
    }

    /// Dead-reckoned pose since construction.
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// Forget encoder history and restart dead reckoning at `pose`.
    pub fn reset(&mut self, pose: Pose2D) {
        self.last_ticks = None;
        self.pose = pose;
    }

    /// Robot-frame delta for the given tick increments.
    pub fn delta_from_ticks(&self, left_ticks: i32, right_ticks: i32) -> OdometryDelta {
        let left = left_ticks as f32 * self.config.meters_per_tick;
        let right = right_ticks as f32 * self.config.meters_per_tick;
        self.differential_drive_delta(left, right)
    }

    fn differential_drive_delta(&self, left: f32, right: f32) -> OdometryDelta {
        const STRAIGHT_THRESHOLD: f32 = 1e-6;

        let delta_theta = (right - left) / self.config.base_width;

        if delta_theta.abs() < STRAIGHT_THRESHOLD {
            Pose2D::new((left + right) / 2.0, 0.0, 0.0)
        } else {
            // Arc about the instantaneous center of curvature
            let radius = (left + right) / (2.0 * delta_theta);
            Pose2D::new(
                radius * delta_theta.sin(),
                radius * (1.0 - delta_theta.cos()),
                delta_theta,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn test_config() -> WheelOdometryConfig {
        WheelOdometryConfig {
            meters_per_tick: 0.001,
            base_width: 0.2,
        }
    }

    #[test]
    fn test_first_update_returns_none() {
        let mut odom = WheelOdometry::new(test_config());
        assert!(odom.update(0, 0).is_none());
    }

    #[test]
    fn test_straight_forward() {
        let mut odom = WheelOdometry::new(test_config());
        odom.update(0, 0);
        let delta = odom.update(1000, 1000).unwrap();
        assert_relative_eq!(delta.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(delta.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(delta.theta, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_in_place() {
        let odom = WheelOdometry::new(test_config());
        // Quarter turn: each wheel travels (base/2)·(π/2)
        let ticks = (0.1 * FRAC_PI_2 * 1000.0).round() as i32;
        let delta = odom.delta_from_ticks(-ticks, ticks);
        assert_relative_eq!(delta.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(delta.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(delta.theta, FRAC_PI_2, epsilon = 0.01);
    }

    #[test]
    fn test_arc_motion() {
        let odom = WheelOdometry::new(test_config());
        let delta = odom.delta_from_ticks(900, 1100);
        // Left turn: moves forward and to the left
        assert!(delta.x > 0.0 && delta.y > 0.0 && delta.theta > 0.0);
        assert_relative_eq!(delta.theta, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_wraparound_and_dead_reckoning() {
        let mut odom = WheelOdometry::new(test_config());
        odom.update(i32::MAX - 100, i32::MAX - 100);
        let delta = odom.update(i32::MIN + 99, i32::MIN + 99).unwrap();
        assert_relative_eq!(delta.x, 0.2, epsilon = 1e-5);

        odom.update(i32::MIN + 299, i32::MIN + 299);
        assert_relative_eq!(odom.pose().x, 0.4, epsilon = 1e-5);
    }
}
