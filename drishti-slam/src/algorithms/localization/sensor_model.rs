//! Sensor model for the particle filter weighting step.
//!
//! Scores a pose hypothesis by matching the frame's observations against
//! the fused vector map: a Gaussian on the distance to the nearest
//! matchable landmark, plus penalties when the free-space sweeps disagree
//! or when the observation sits inside space the landmark says is free.

use serde::{Deserialize, Serialize};

use crate::algorithms::mapping::MapSnapshot;
use crate::core::types::{Observation, Pose2D};

/// Configuration for the sensor model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorModelConfig {
    /// Search radius for the nearest landmark (meters).
    /// Typical: 0.2-0.5
    pub match_radius: f32,

    /// Standard deviation added to every match (meters).
    /// Keeps freshly inserted, sharp landmarks from dominating.
    pub sigma_floor: f32,

    /// Tolerance for comparing sweep bounds (radians).
    pub sweep_tolerance: f32,

    /// Likelihood factor for a match whose sweeps disagree, in (0, 1].
    pub sweep_mismatch_penalty: f64,

    /// Likelihood factor for an observation inside a landmark's free space, in (0, 1].
    pub free_space_penalty: f64,

    /// Log-likelihood of an observation with no landmark in range.
    /// Also the floor for a single matched observation.
    pub unmatched_log_likelihood: f64,
}

impl Default for SensorModelConfig {
    fn default() -> Self {
        Self {
            match_radius: 0.3,
            sigma_floor: 0.03,
            sweep_tolerance: 0.35,
            sweep_mismatch_penalty: 0.2,
            free_space_penalty: 0.05,
            unmatched_log_likelihood: -4.5,
        }
    }
}

impl SensorModelConfig {
    /// Tight matching for well-mapped, low-noise environments.
    pub fn high_quality() -> Self {
        Self {
            match_radius: 0.2,
            sigma_floor: 0.02,
            ..Default::default()
        }
    }

    /// Loose matching for noisy scanners or poor odometry.
    pub fn tolerant() -> Self {
        Self {
            match_radius: 0.5,
            sigma_floor: 0.06,
            sweep_tolerance: 0.6,
            ..Default::default()
        }
    }
}

/// Trait for sensor models used in the particle filter.
pub trait SensorModel {
    /// Compute log(p(observations | pose, map)).
    ///
    /// `observations` carry robot-frame geometry; implementations place
    /// them at `pose` themselves.
    fn log_likelihood(&self, observations: &[Observation], pose: &Pose2D, map: &MapSnapshot)
    -> f64;
}

/// Nearest-landmark matching model over a [`MapSnapshot`].
#[derive(Debug, Clone)]
pub struct MapMatchModel {
    config: SensorModelConfig,
    ln_sweep_mismatch: f64,
    ln_free_space: f64,
}

impl MapMatchModel {
    /// Create a new model.
    pub fn new(config: SensorModelConfig) -> Self {
        Self {
            config,
            ln_sweep_mismatch: config.sweep_mismatch_penalty.ln(),
            ln_free_space: config.free_space_penalty.ln(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SensorModelConfig {
        &self.config
    }

    /// Log-likelihood of one observation already placed in the world frame.
    pub fn score(&self, obs: &Observation, map: &MapSnapshot) -> f64 {
        let c = &self.config;
        let Some(landmark) = map.nearest_matchable(obs.position, c.match_radius) else {
            return c.unmatched_log_likelihood;
        };

        let variance =
            (landmark.variance() + obs.variance() + c.sigma_floor * c.sigma_floor) as f64;
        let residual = obs.position - landmark.position;
        let d = residual.length() as f64;
        let d2 = d * d;
        let mut ll = (-0.5 * d2 / variance).max(c.unmatched_log_likelihood);

        let free = landmark.sweep();
        if !obs.sweep.agrees_with(&free, c.sweep_tolerance) {
            ll += self.ln_sweep_mismatch;
        }
        if d2 > 4.0 * variance && free.contains(residual.angle()) == Some(true) {
            ll += self.ln_free_space;
        }
        ll
    }
}

impl SensorModel for MapMatchModel {
    fn log_likelihood(
        &self,
        observations: &[Observation],
        pose: &Pose2D,
        map: &MapSnapshot,
    ) -> f64 {
        observations
            .iter()
            .filter(|obs| !obs.is_marker())
            .map(|obs| self.score(&obs.relocate(pose), map))
            .sum()
    }
}
