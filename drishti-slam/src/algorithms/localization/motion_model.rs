//! Odometry-based motion model for the particle filter.
//!
//! The standard rotation-translation-rotation odometry model: the measured
//! delta is decomposed into an initial turn, a straight move and a final
//! turn, and each component is perturbed with noise proportional to the
//! motion. A small floor noise is always added so that a stationary
//! particle set keeps some diversity.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::core::math::normalize_angle;
use crate::core::types::{OdometryDelta, Pose2D};

/// Configuration for the odometry motion model.
///
/// The alpha parameters control noise proportional to motion:
/// - `alpha1`: Rotation noise from rotation (rad/rad)
/// - `alpha2`: Rotation noise from translation (rad/m)
/// - `alpha3`: Translation noise from translation (m/m)
/// - `alpha4`: Translation noise from rotation (m/rad)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionModelConfig {
    /// Rotation noise from rotation (rad/rad).
    /// Typical: 0.1-0.2 for differential drive.
    pub alpha1: f32,

    /// Rotation noise from translation (rad/m).
    /// Typical: 0.05-0.1 for differential drive.
    pub alpha2: f32,

    /// Translation noise from translation (m/m).
    /// Typical: 0.1-0.2 for differential drive.
    pub alpha3: f32,

    /// Translation noise from rotation (m/rad).
    /// Typical: 0.05-0.1 for differential drive.
    pub alpha4: f32,

    /// Position noise added every step, moving or not (meters).
    pub min_sigma_xy: f32,

    /// Heading noise added every step, moving or not (radians).
    pub min_sigma_theta: f32,
}

impl Default for MotionModelConfig {
    fn default() -> Self {
        Self {
            alpha1: 0.15,
            alpha2: 0.08,
            alpha3: 0.15,
            alpha4: 0.08,
            min_sigma_xy: 0.005,
            min_sigma_theta: 0.002,
        }
    }
}

impl MotionModelConfig {
    /// Create a low-noise configuration (high quality encoders).
    pub fn low_noise() -> Self {
        Self {
            alpha1: 0.05,
            alpha2: 0.02,
            alpha3: 0.05,
            alpha4: 0.02,
            min_sigma_xy: 0.002,
            min_sigma_theta: 0.001,
        }
    }

    /// Create a high-noise configuration (slippery floors, poor encoders).
    pub fn high_noise() -> Self {
        Self {
            alpha1: 0.3,
            alpha2: 0.15,
            alpha3: 0.3,
            alpha4: 0.15,
            min_sigma_xy: 0.01,
            min_sigma_theta: 0.005,
        }
    }

    /// No noise at all; particles follow odometry exactly.
    pub fn noiseless() -> Self {
        Self {
            alpha1: 0.0,
            alpha2: 0.0,
            alpha3: 0.0,
            alpha4: 0.0,
            min_sigma_xy: 0.0,
            min_sigma_theta: 0.0,
        }
    }
}

/// Odometry motion model for sampling particle poses.
#[derive(Debug, Clone)]
pub struct MotionModel {
    config: MotionModelConfig,
}

impl MotionModel {
    /// Create a new motion model with the given configuration.
    pub fn new(config: MotionModelConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MotionModelConfig {
        &self.config
    }

    /// Sample a new pose given the current pose and an odometry delta.
    ///
    /// # Arguments
    /// * `pose` - Current particle pose
    /// * `odom_delta` - Measured motion in the robot frame
    /// * `rng` - Random source for this particle
    pub fn sample<R: Rng + ?Sized>(
        &self,
        pose: &Pose2D,
        odom_delta: &OdometryDelta,
        rng: &mut R,
    ) -> Pose2D {
        let c = &self.config;
        let delta_trans = odom_delta.x.hypot(odom_delta.y);

        let moved = if delta_trans < 1e-6 && odom_delta.theta.abs() < 1e-6 {
            *pose
        } else {
            let delta_rot1 = if delta_trans > 1e-6 {
                normalize_angle(odom_delta.y.atan2(odom_delta.x))
            } else {
                0.0
            };
            let delta_rot2 = normalize_angle(odom_delta.theta - delta_rot1);

            let rot1_abs = delta_rot1.abs();
            let rot2_abs = delta_rot2.abs();
            let sigma_rot1 = (c.alpha1 * rot1_abs + c.alpha2 * delta_trans).sqrt();
            let sigma_trans = (c.alpha3 * delta_trans + c.alpha4 * (rot1_abs + rot2_abs)).sqrt();
            let sigma_rot2 = (c.alpha1 * rot2_abs + c.alpha2 * delta_trans).sqrt();

            let noisy_rot1 = delta_rot1 + sample_gaussian(rng, sigma_rot1);
            let noisy_trans = delta_trans + sample_gaussian(rng, sigma_trans);
            let noisy_rot2 = delta_rot2 + sample_gaussian(rng, sigma_rot2);

            let heading = normalize_angle(pose.theta + noisy_rot1);
            Pose2D::new(
                pose.x + noisy_trans * heading.cos(),
                pose.y + noisy_trans * heading.sin(),
                heading + noisy_rot2,
            )
        };

        Pose2D::new(
            moved.x + sample_gaussian(rng, c.min_sigma_xy),
            moved.y + sample_gaussian(rng, c.min_sigma_xy),
            moved.theta + sample_gaussian(rng, c.min_sigma_theta),
        )
    }
}

/// Sample from a zero-mean Gaussian.
#[inline]
fn sample_gaussian<R: Rng + ?Sized>(rng: &mut R, sigma: f32) -> f32 {
    if sigma < 1e-10 {
        return 0.0;
    }
    let n: f32 = rng.sample(StandardNormal);
    n * sigma
}
