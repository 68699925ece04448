//! Perception algorithms.
//!
//! - [`segmentation`]: range frame → [`ScanPoint`](crate::core::types::ScanPoint) segments
//! - [`features`]: segments → world-frame observations
//! - [`mapping`]: fused landmark map with striped per-region locking
//! - [`localization`]: particle filter and pose estimation

pub mod features;
pub mod localization;
pub mod mapping;
pub mod segmentation;
