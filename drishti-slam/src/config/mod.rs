//! Unified configuration loading.
//!
//! Loads all configuration from a single YAML file with sensible defaults.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drishti_slam::config::DrishtiConfig;
//!
//! // Load from default path (configs/drishti.yaml)
//! let config = DrishtiConfig::load_default()?;
//!
//! // Or use built-in defaults (no file needed)
//! let config = DrishtiConfig::default();
//!
//! let pipeline = drishti_slam::Pipeline::new(config.pipeline_config());
//! ```
//!
//! ## Configuration Sections
//!
//! | Section | Description |
//! |---------|-------------|
//! | [`ScannerSection`] | Beam count, angular span, distance band |
//! | [`OdometrySection`] | Encoder tick size, wheel base |
//! | `segmenter` | Discontinuity and corner thresholds |
//! | `features` | Observation uncertainty model |
//! | `map` | Fusion radius, sweep tolerance, lock striping |
//! | `filter` | Particle count, motion noise, likelihood shape |
//! | [`RuntimeSection`] | Worker thread latency budget |
//!
//! ## Example YAML
//!
//! ```yaml
//! scanner:
//!   distance_count: 1081
//!   minimum_distance: 0.1
//! segmenter:
//!   discontinuity_threshold: 1.4
//! map:
//!   match_radius: 0.15
//! filter:
//!   num_particles: 200
//!   seed: 42
//! ```

mod defaults;
mod drishti;
mod error;
mod sections;

pub use drishti::DrishtiConfig;
pub use error::ConfigLoadError;
pub use sections::{OdometrySection, RuntimeSection, ScannerSection};
