//! Core foundation layer.
//!
//! This is the bottom layer of the perception stack with no internal
//! dependencies. All other layers depend on core.
//!
//! # Contents
//!
//! - [`types`]: Core data types (poses, scan frames, segments, observations,
//!   map points, particles)
//! - [`math`]: Angular arithmetic (normalization, circular means, sweeps)

pub mod math;
pub mod types;
