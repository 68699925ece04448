//! Particle filter (Monte Carlo Localization) over the vector map.
//!
//! One frame runs three phases, each consuming the previous phase's value:
//!
//! ```text
//! ParticleFilter::predict ──► Predicted
//!     Predicted ──weigh──► Weighted      (estimate available here)
//!     Weighted ──resample──► FilterUpdate
//! ParticleFilter::commit(FilterUpdate)
//! ```
//!
//! Nothing is written to the filter until [`ParticleFilter::commit`], so a
//! pass abandoned between phases leaves the published particle set intact.
//! Predict and weigh run in parallel; every particle draws its noise from
//! its own RNG stream keyed by (seed, iteration, index), which keeps the
//! result independent of how rayon schedules the work.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithms::mapping::MapSnapshot;
use crate::core::types::{Observation, OdometryDelta, Particle, Pose2D};

use super::estimator::{PoseCovariance, estimate_covariance, estimate_pose};
use super::motion_model::{MotionModel, MotionModelConfig};
use super::sensor_model::{MapMatchModel, SensorModel, SensorModelConfig};

/// Stream index reserved for the resampling draw.
const RESAMPLE_STREAM: u64 = u64::MAX;

/// Configuration for the particle filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleFilterConfig {
    /// Number of particles.
    pub num_particles: usize,

    /// Effective particle ratio threshold for resampling.
    /// Resample when Neff / num_particles < this value.
    /// Typical: 0.5
    pub resampling_threshold: f64,

    /// Motion model configuration.
    pub motion: MotionModelConfig,

    /// Sensor model configuration.
    pub sensor: SensorModelConfig,

    /// Initial position spread (standard deviation, meters).
    pub initial_spread_xy: f32,

    /// Initial heading spread (standard deviation, radians).
    pub initial_spread_theta: f32,

    /// Random seed for deterministic behavior (0 for random).
    pub seed: u64,
}

impl Default for ParticleFilterConfig {
    fn default() -> Self {
        Self {
            num_particles: 500,
            resampling_threshold: 0.5,
            motion: MotionModelConfig::default(),
            sensor: SensorModelConfig::default(),
            initial_spread_xy: 0.05,
            initial_spread_theta: 0.05,
            seed: 0,
        }
    }
}

impl ParticleFilterConfig {
    /// Create a configuration for global localization (large spread).
    pub fn global_localization() -> Self {
        Self {
            num_particles: 2000,
            initial_spread_xy: 10.0,
            initial_spread_theta: std::f32::consts::PI,
            motion: MotionModelConfig::high_noise(),
            sensor: SensorModelConfig::tolerant(),
            ..Default::default()
        }
    }

    /// Create a configuration for tracking (small spread).
    pub fn tracking() -> Self {
        Self {
            num_particles: 200,
            initial_spread_xy: 0.02,
            initial_spread_theta: 0.02,
            motion: MotionModelConfig::low_noise(),
            ..Default::default()
        }
    }

    /// Same configuration with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// State of the particle filter for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleFilterState {
    /// Effective number of particles.
    pub neff: f64,
    /// Whether resampling occurred this iteration.
    pub resampled: bool,
    /// Best particle weight.
    pub max_weight: f64,
    /// Total number of iterations.
    pub iterations: u64,
    /// Number of times the weights collapsed and were reset to uniform.
    pub degenerate_resets: u64,
}

/// Particles advanced by the motion model, weights carried over.
#[derive(Debug, Clone)]
pub struct Predicted {
    particles: Vec<Particle>,
    iteration: u64,
}

impl Predicted {
    /// Predicted particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Estimate of the predicted set, used to place the frame's observations.
    pub fn estimate(&self) -> Pose2D {
        estimate_pose(&self.particles)
    }
}

/// Particles with normalized weights and the resulting pose estimate.
#[derive(Debug, Clone)]
pub struct Weighted {
    particles: Vec<Particle>,
    iteration: u64,
    estimate: Pose2D,
    neff: f64,
    max_weight: f64,
    degenerate: bool,
}

impl Weighted {
    fn from_normalized(particles: Vec<Particle>, iteration: u64, degenerate: bool) -> Self {
        let sum_sq: f64 = particles.iter().map(|p| p.weight * p.weight).sum();
        let neff = if sum_sq > 1e-300 { 1.0 / sum_sq } else { 0.0 };
        let max_weight = particles.iter().map(|p| p.weight).fold(0.0, f64::max);
        let estimate = estimate_pose(&particles);
        Self {
            particles,
            iteration,
            estimate,
            neff,
            max_weight,
            degenerate,
        }
    }

    /// Weighted particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Pose estimate of the weighted set.
    pub fn estimate(&self) -> Pose2D {
        self.estimate
    }

    /// Effective number of particles.
    pub fn neff(&self) -> f64 {
        self.neff
    }

    /// True if the weights collapsed and were reset to uniform.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }
}

/// A complete new particle set, ready to commit.
#[derive(Debug, Clone)]
pub struct FilterUpdate {
    particles: Arc<[Particle]>,
    iteration: u64,
    estimate: Pose2D,
    neff: f64,
    max_weight: f64,
    resampled: bool,
    degenerate: bool,
}

impl FilterUpdate {
    /// New particle set.
    pub fn particles(&self) -> &Arc<[Particle]> {
        &self.particles
    }

    /// Pose estimate computed before resampling.
    pub fn estimate(&self) -> Pose2D {
        self.estimate
    }

    /// Whether the set was resampled.
    pub fn resampled(&self) -> bool {
        self.resampled
    }
}

/// Monte Carlo Localization particle filter.
#[derive(Debug)]
pub struct ParticleFilter {
    config: ParticleFilterConfig,
    particles: Arc<[Particle]>,
    motion_model: MotionModel,
    sensor_model: MapMatchModel,
    base_seed: u64,
    epoch: u64,
    state: ParticleFilterState,
}

impl ParticleFilter {
    /// Create a new particle filter initialized around the given pose.
    pub fn new(config: ParticleFilterConfig, initial_pose: Pose2D) -> Self {
        let base_seed = if config.seed == 0 {
            rand::rng().random()
        } else {
            config.seed
        };

        let mut filter = Self {
            motion_model: MotionModel::new(config.motion),
            sensor_model: MapMatchModel::new(config.sensor),
            particles: Arc::from(Vec::new()),
            base_seed,
            epoch: 0,
            state: ParticleFilterState::default(),
            config,
        };
        filter.particles = filter.scatter(&initial_pose);
        filter
    }

    /// Gaussian cloud around `center` with uniform weights.
    fn scatter(&self, center: &Pose2D) -> Arc<[Particle]> {
        let n = self.config.num_particles.max(1);
        let weight = 1.0 / n as f64;
        let spread_xy = self.config.initial_spread_xy;
        let spread_theta = self.config.initial_spread_theta;
        let mut rng = self.stream(0, RESAMPLE_STREAM - 1);
        (0..n)
            .map(|_| {
                let dx: f32 = rng.sample(StandardNormal);
                let dy: f32 = rng.sample(StandardNormal);
                let dt: f32 = rng.sample(StandardNormal);
                let pose = Pose2D::new(
                    center.x + dx * spread_xy,
                    center.y + dy * spread_xy,
                    center.theta + dt * spread_theta,
                );
                Particle::with_weight(pose, weight)
            })
            .collect()
    }

    /// Independent RNG for one (iteration, index) pair.
    fn stream(&self, iteration: u64, index: u64) -> StdRng {
        let mut key = splitmix64(self.base_seed ^ splitmix64(self.epoch));
        key = splitmix64(key ^ iteration);
        StdRng::seed_from_u64(splitmix64(key ^ index))
    }

    /// Get the configuration.
    pub fn config(&self) -> &ParticleFilterConfig {
        &self.config
    }

    /// Get current particles (for visualization).
    pub fn particles(&self) -> &Arc<[Particle]> {
        &self.particles
    }

    /// Get current filter state (for diagnostics).
    pub fn state(&self) -> &ParticleFilterState {
        &self.state
    }

    /// Get the number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Pose estimate of the committed set.
    pub fn estimate(&self) -> Pose2D {
        estimate_pose(&self.particles)
    }

    /// Covariance of the committed set.
    pub fn covariance(&self) -> PoseCovariance {
        estimate_covariance(&self.particles)
    }

    /// Prediction phase: propagate every particle through the motion model.
    pub fn predict(&self, odom_delta: &OdometryDelta) -> Predicted {
        let iteration = self.state.iterations + 1;
        let particles = self
            .particles
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let mut rng = self.stream(iteration, i as u64);
                let pose = self.motion_model.sample(&p.pose, odom_delta, &mut rng);
                Particle::with_weight(pose, p.weight)
            })
            .collect();
        Predicted {
            particles,
            iteration,
        }
    }

    /// Weighting phase: score each particle against the map snapshot.
    ///
    /// New weights are the prior weights times the observation likelihood,
    /// normalized with log-sum-exp. If nothing finite survives the set is
    /// reset to uniform weights.
    pub fn weigh(
        &self,
        predicted: Predicted,
        observations: &[Observation],
        map: &MapSnapshot,
    ) -> Weighted {
        let Predicted {
            mut particles,
            iteration,
        } = predicted;

        let log_weights: Vec<f64> = particles
            .par_iter()
            .map(|p| {
                let ll = self.sensor_model.log_likelihood(observations, &p.pose, map);
                let lw = p.weight.ln() + ll;
                if lw.is_nan() { f64::NEG_INFINITY } else { lw }
            })
            .collect();

        let max_log_weight = log_weights
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let sum_exp: f64 = if max_log_weight.is_finite() {
            log_weights
                .iter()
                .map(|&lw| (lw - max_log_weight).exp())
                .sum()
        } else {
            0.0
        };

        let degenerate = !(sum_exp.is_finite() && sum_exp > 0.0);
        if degenerate {
            log::warn!(
                "Particle weights degenerate at iteration {}, resetting to uniform",
                iteration
            );
            let uniform = 1.0 / particles.len().max(1) as f64;
            for p in &mut particles {
                p.weight = uniform;
            }
        } else {
            for (p, lw) in particles.iter_mut().zip(&log_weights) {
                p.weight = (lw - max_log_weight).exp() / sum_exp;
            }
        }

        Weighted::from_normalized(particles, iteration, degenerate)
    }

    /// Resampling phase: systematic resampling when Neff drops below the threshold.
    pub fn resample(&self, weighted: Weighted) -> FilterUpdate {
        let n = weighted.particles.len();
        let threshold = self.config.resampling_threshold * n as f64;
        let resampled = n > 0 && weighted.neff < threshold;

        let particles: Arc<[Particle]> = if resampled {
            let mut rng = self.stream(weighted.iteration, RESAMPLE_STREAM);
            low_variance_resample(&weighted.particles, &mut rng).into()
        } else {
            weighted.particles.into()
        };

        if resampled {
            log::trace!(
                "Resampled {} particles (neff {:.1})",
                particles.len(),
                weighted.neff
            );
        }

        FilterUpdate {
            particles,
            iteration: weighted.iteration,
            estimate: weighted.estimate,
            neff: weighted.neff,
            max_weight: weighted.max_weight,
            resampled,
            degenerate: weighted.degenerate,
        }
    }

    /// Install a completed update as the current particle set.
    pub fn commit(&mut self, update: FilterUpdate) {
        self.particles = update.particles;
        self.state.iterations = update.iteration;
        self.state.neff = update.neff;
        self.state.max_weight = update.max_weight;
        self.state.resampled = update.resampled;
        if update.degenerate {
            self.state.degenerate_resets += 1;
        }
    }

    /// Run predict, weigh, resample and commit in one call.
    ///
    /// Returns the pose estimate of the weighted set.
    pub fn update(
        &mut self,
        odom_delta: &OdometryDelta,
        observations: &[Observation],
        map: &MapSnapshot,
    ) -> Pose2D {
        let predicted = self.predict(odom_delta);
        let weighted = self.weigh(predicted, observations, map);
        let update = self.resample(weighted);
        let estimate = update.estimate();
        self.commit(update);
        estimate
    }

    /// Reset the filter to a new pose.
    pub fn reset(&mut self, pose: Pose2D) {
        self.epoch += 1;
        self.particles = self.scatter(&pose);
        self.state = ParticleFilterState::default();
    }
}

/// Low-variance (systematic) resampling to the same size with uniform weights.
fn low_variance_resample<R: Rng + ?Sized>(particles: &[Particle], rng: &mut R) -> Vec<Particle> {
    let n = particles.len();
    if n == 0 {
        return Vec::new();
    }

    let total: f64 = particles.iter().map(|p| p.weight).sum();
    let mut cumulative = Vec::with_capacity(n);
    let mut sum = 0.0;
    for (i, p) in particles.iter().enumerate() {
        if total > 1e-300 {
            sum += p.weight / total;
        } else {
            sum = (i + 1) as f64 / n as f64;
        }
        cumulative.push(sum);
    }

    let step = 1.0 / n as f64;
    let mut r = rng.random::<f64>() * step;
    let mut idx = 0;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        while r > cumulative[idx] && idx < n - 1 {
            idx += 1;
        }
        out.push(Particle::with_weight(particles[idx].pose, step));
        r += step;
    }
    out
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
