//! Sensor layer: frame ingest, wheel odometry, simulated scanner.
//!
//! Hardware drivers live outside this crate. This layer validates what
//! they deliver and converts encoder ticks into odometry deltas.

pub mod ingest;
pub mod odometry;
pub mod simulation;

pub use ingest::{FrameIngest, validate_frame, validate_odometry};
pub use odometry::{WheelOdometry, WheelOdometryConfig};
pub use simulation::{SimulatedLidar, WallSegment};
