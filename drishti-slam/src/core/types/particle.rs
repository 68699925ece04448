//! Weighted pose hypothesis.

use serde::{Deserialize, Serialize};

use super::pose::Pose2D;

/// A single particle: a hypothesized robot pose with importance weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Hypothesized robot pose.
    pub pose: Pose2D,
    /// Importance weight (normalized across the set after weighting).
    pub weight: f64,
}

impl Particle {
    /// Create a new particle with unit weight.
    pub fn new(pose: Pose2D) -> Self {
        Self { pose, weight: 1.0 }
    }

    /// Create a new particle with specified weight.
    pub fn with_weight(pose: Pose2D, weight: f64) -> Self {
        Self { pose, weight }
    }
}
