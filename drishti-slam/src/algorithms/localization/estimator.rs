//! Reduction of a particle set to a single pose estimate.

use crate::core::math::{angle_diff, circular_mean, weighted_circular_mean};
use crate::core::types::{Particle, Pose2D};

/// Spread of the particle set around its estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseCovariance {
    /// Variance in x (m²)
    pub xx: f32,
    /// Covariance of x and y (m²)
    pub xy: f32,
    /// Variance in y (m²)
    pub yy: f32,
    /// Heading variance (rad²)
    pub theta: f32,
}

impl PoseCovariance {
    /// Large uncertainty, used when the set carries no usable weight.
    pub fn unknown() -> Self {
        Self {
            xx: 1.0,
            xy: 0.0,
            yy: 1.0,
            theta: 0.5,
        }
    }
}

/// Best-estimate pose of a particle set.
///
/// Weighted mean of position and weighted circular mean of heading. If the
/// weights are degenerate (non-finite or summing to zero) every particle
/// counts equally. An empty set yields the identity pose.
pub fn estimate_pose(particles: &[Particle]) -> Pose2D {
    if particles.is_empty() {
        return Pose2D::identity();
    }

    let total: f64 = particles.iter().map(|p| p.weight).sum();
    if total.is_finite() && total > 1e-12 && particles.iter().all(|p| p.weight >= 0.0) {
        let mut sum_x = 0.0f64;
        let mut sum_y = 0.0f64;
        for p in particles {
            sum_x += p.weight * p.pose.x as f64;
            sum_y += p.weight * p.pose.y as f64;
        }
        let heading = weighted_circular_mean(
            particles
                .iter()
                .map(|p| (p.pose.theta, (p.weight / total) as f32)),
        );
        if let Some(theta) = heading {
            return Pose2D::new((sum_x / total) as f32, (sum_y / total) as f32, theta);
        }
    }

    let n = particles.len() as f64;
    let mean_x = particles.iter().map(|p| p.pose.x as f64).sum::<f64>() / n;
    let mean_y = particles.iter().map(|p| p.pose.y as f64).sum::<f64>() / n;
    let theta = circular_mean(particles.iter().map(|p| p.pose.theta)).unwrap_or(0.0);
    Pose2D::new(mean_x as f32, mean_y as f32, theta)
}

/// Weighted covariance of the set around [`estimate_pose`].
pub fn estimate_covariance(particles: &[Particle]) -> PoseCovariance {
    let mean = estimate_pose(particles);
    let mut xx = 0.0f64;
    let mut xy = 0.0f64;
    let mut yy = 0.0f64;
    let mut tt = 0.0f64;
    let mut total = 0.0f64;

    for p in particles {
        let dx = (p.pose.x - mean.x) as f64;
        let dy = (p.pose.y - mean.y) as f64;
        let dtheta = angle_diff(mean.theta, p.pose.theta) as f64;
        xx += p.weight * dx * dx;
        xy += p.weight * dx * dy;
        yy += p.weight * dy * dy;
        tt += p.weight * dtheta * dtheta;
        total += p.weight;
    }

    if total.is_finite() && total > 1e-12 {
        PoseCovariance {
            xx: (xx / total) as f32,
            xy: (xy / total) as f32,
            yy: (yy / total) as f32,
            theta: (tt / total) as f32,
        }
    } else {
        PoseCovariance::unknown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_weighted_mean() {
        let particles = [
            Particle::with_weight(Pose2D::new(0.0, 0.0, 0.0), 0.25),
            Particle::with_weight(Pose2D::new(4.0, 2.0, 0.0), 0.75),
        ];
        let pose = estimate_pose(&particles);
        assert_relative_eq!(pose.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(pose.y, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_heading_wraps() {
        let particles = [
            Particle::with_weight(Pose2D::new(0.0, 0.0, PI - 0.1), 0.5),
            Particle::with_weight(Pose2D::new(0.0, 0.0, -PI + 0.1), 0.5),
        ];
        let pose = estimate_pose(&particles);
        assert_relative_eq!(pose.theta.abs(), PI, epsilon = 1e-4);
    }

    #[test]
    fn test_degenerate_weights_fall_back_to_plain_mean() {
        let particles = [
            Particle::with_weight(Pose2D::new(1.0, 0.0, 0.2), 0.0),
            Particle::with_weight(Pose2D::new(3.0, 0.0, 0.2), 0.0),
        ];
        let pose = estimate_pose(&particles);
        assert_relative_eq!(pose.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(pose.theta, 0.2, epsilon = 1e-5);

        let nan = [
            Particle::with_weight(Pose2D::new(1.0, 1.0, 0.0), f64::NAN),
            Particle::with_weight(Pose2D::new(3.0, 3.0, 0.0), 1.0),
        ];
        let pose = estimate_pose(&nan);
        assert_relative_eq!(pose.x, 2.0, epsilon = 1e-5);
        assert!(pose.is_finite());
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(estimate_pose(&[]), Pose2D::identity());
        assert_eq!(estimate_covariance(&[]), PoseCovariance::unknown());
    }

    #[test]
    fn test_covariance_of_spread() {
        let particles = [
            Particle::with_weight(Pose2D::new(-1.0, 0.0, 0.0), 0.5),
            Particle::with_weight(Pose2D::new(1.0, 0.0, 0.0), 0.5),
        ];
        let cov = estimate_covariance(&particles);
        assert_relative_eq!(cov.xx, 1.0, epsilon = 1e-5);
        assert_relative_eq!(cov.yy, 0.0, epsilon = 1e-6);
        assert_relative_eq!(cov.theta, 0.0, epsilon = 1e-6);
    }
}
