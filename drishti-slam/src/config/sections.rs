//! Scanner, odometry and runtime sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::types::LaserGeometry;
use crate::sensors::WheelOdometryConfig;
use crate::threads::PipelineThreadConfig;

use super::defaults;

/// Range scanner geometry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScannerSection {
    /// Readings per revolution
    #[serde(default = "defaults::distance_count")]
    pub distance_count: usize,

    /// Beam angle of the first reading (radians)
    #[serde(default = "defaults::angle_start")]
    pub angle_start: f32,

    /// Angle from first to last reading (radians)
    #[serde(default = "defaults::angle_width")]
    pub angle_width: f32,

    /// Minimum valid range (meters)
    #[serde(default = "defaults::minimum_distance")]
    pub minimum_distance: f32,

    /// Maximum valid range (meters)
    #[serde(default = "defaults::maximum_distance")]
    pub maximum_distance: f32,

    /// One-sigma range accuracy (meters)
    #[serde(default = "defaults::distance_accuracy")]
    pub distance_accuracy: f32,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            distance_count: defaults::distance_count(),
            angle_start: defaults::angle_start(),
            angle_width: defaults::angle_width(),
            minimum_distance: defaults::minimum_distance(),
            maximum_distance: defaults::maximum_distance(),
            distance_accuracy: defaults::distance_accuracy(),
        }
    }
}

impl ScannerSection {
    /// Convert to LaserGeometry
    pub fn to_geometry(&self) -> LaserGeometry {
        let mut geometry = LaserGeometry::uniform(
            self.distance_count,
            self.angle_start,
            self.angle_start + self.angle_width,
            self.minimum_distance,
            self.maximum_distance,
        );
        geometry.distance_accuracy = self.distance_accuracy;
        geometry
    }
}

/// Wheel encoder geometry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OdometrySection {
    /// Distance travelled per encoder tick (meters)
    #[serde(default = "defaults::meters_per_tick")]
    pub meters_per_tick: f32,

    /// Distance between the wheels (meters)
    #[serde(default = "defaults::base_width")]
    pub base_width: f32,
}

impl Default for OdometrySection {
    fn default() -> Self {
        Self {
            meters_per_tick: defaults::meters_per_tick(),
            base_width: defaults::base_width(),
        }
    }
}

impl OdometrySection {
    /// Convert to WheelOdometryConfig
    pub fn to_odometry_config(&self) -> WheelOdometryConfig {
        WheelOdometryConfig {
            meters_per_tick: self.meters_per_tick,
            base_width: self.base_width,
        }
    }
}

/// Worker thread settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeSection {
    /// Age after which an in-flight pass yields to a newer frame (milliseconds)
    #[serde(default = "defaults::max_pass_latency_ms")]
    pub max_pass_latency_ms: u64,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            max_pass_latency_ms: defaults::max_pass_latency_ms(),
        }
    }
}

impl RuntimeSection {
    /// Convert to PipelineThreadConfig
    pub fn to_thread_config(&self) -> PipelineThreadConfig {
        PipelineThreadConfig {
            max_pass_latency: Duration::from_millis(self.max_pass_latency_ms),
        }
    }
}
