//! Core data types for the perception pipeline.
//!
//! - [`Point2D`], [`Pose2D`]: planar geometry
//! - [`ScanFrame`], [`LaserGeometry`]: one revolution of raw ranges
//! - [`ScanPoint`]: a segment of contiguous readings
//! - [`Observation`], [`Sweep`]: candidate landmarks in world frame
//! - [`MapPoint`], [`AngleBound`]: fused landmarks
//! - [`Particle`]: weighted pose hypothesis

mod map_point;
mod observation;
mod particle;
mod pose;
mod scan;

pub use map_point::{AngleBound, MapPoint};
pub use observation::{Observation, Sweep};
pub use particle::Particle;
pub use pose::{Point2D, Pose2D};
pub use scan::{LaserGeometry, ScanFrame, ScanPoint};

/// Pose increment expressed in the robot frame at the previous pose.
pub type OdometryDelta = Pose2D;
