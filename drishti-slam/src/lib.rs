//! DrishtiSLAM - LIDAR perception core for mobile robots
//!
//! Turns polar range scans into a vector map of landmark points and tracks
//! the robot's pose in that map with a particle filter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    threads/                         │  ← Worker thread
//! │          (latest-frame-wins pipeline loop)          │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │        (per-frame pass, cancel, publishing)         │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Core algorithms
//! │  (segmentation, features, mapping, localization)    │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Sensor input
//! │        (ingest, wheel odometry, simulation)         │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │               core/ config/ error                   │  ← Foundation
//! │        (types, math, YAML config, errors)           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Per-frame data flow
//!
//! ScanFrame → Segmenter → FeatureBuilder → {ParticleFilter weighting,
//! VectorMap fusion} → pose estimate → [`PipelineOutput`].
//!
//! # Example
//!
//! ```rust,ignore
//! use drishti_slam::{DrishtiConfig, Pipeline};
//!
//! let config = DrishtiConfig::load_default()?;
//! let pipeline = Pipeline::new(config.pipeline_config());
//! let report = pipeline.process(&frame, &odometry_delta)?;
//! println!("pose {:?}, map {} points", report.pose, pipeline.map().len());
//! ```

// ============================================================================
// Layer 1: Foundation (no internal deps)
// ============================================================================
pub mod config;
pub mod core;
pub mod error;

// ============================================================================
// Layer 2: Sensor input (depends on core)
// ============================================================================
pub mod sensors;

// ============================================================================
// Layer 3: Algorithms (depends on core)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Layer 4: Pipeline engine (depends on all of the above)
// ============================================================================
pub mod engine;

// ============================================================================
// Layer 5: Threading
// ============================================================================
pub mod threads;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use core::math;
pub use core::types::{AngleBound, MapPoint, Observation, Particle, Sweep};
pub use core::types::{LaserGeometry, OdometryDelta, ScanFrame, ScanPoint};
pub use core::types::{Point2D, Pose2D};

// Configuration and errors
pub use config::{ConfigLoadError, DrishtiConfig};
pub use error::{FrameError, PipelineError, Result};

// Sensors
pub use sensors::{FrameIngest, SimulatedLidar, WallSegment, WheelOdometry, WheelOdometryConfig};

// Algorithms
pub use algorithms::features::{FeatureBuilder, FeatureConfig};
pub use algorithms::localization::{
    MotionModelConfig, ParticleFilter, ParticleFilterConfig, SensorModelConfig, estimate_pose,
};
pub use algorithms::mapping::{FuseOutcome, MapSnapshot, VectorMap, VectorMapConfig};
pub use algorithms::segmentation::{Segmenter, SegmenterConfig};

// Engine
pub use engine::{CancelToken, FrameReport, Pipeline, PipelineConfig, PipelineOutput};
pub use threads::{PipelineThread, PipelineThreadConfig};
