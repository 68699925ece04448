//! Localization algorithms.
//!
//! Monte Carlo localization against the vector map:
//! - [`MotionModel`]: rot1-trans-rot2 odometry noise
//! - [`SensorModel`] / [`MapMatchModel`]: observation-to-landmark likelihood
//! - [`ParticleFilter`]: predict / weigh / resample stages
//! - [`estimate_pose`]: particle set to a single pose

mod estimator;
mod motion_model;
mod particle_filter;
mod sensor_model;

pub use estimator::{PoseCovariance, estimate_covariance, estimate_pose};
pub use motion_model::{MotionModel, MotionModelConfig};
pub use particle_filter::{
    FilterUpdate, ParticleFilter, ParticleFilterConfig, ParticleFilterState, Predicted, Weighted,
};
pub use sensor_model::{MapMatchModel, SensorModel, SensorModelConfig};
