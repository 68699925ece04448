//! Observation building.
//!
//! Turns scan segments into world-frame [`Observation`](crate::core::types::Observation)s
//! carrying position, range-dependent uncertainty and a free-space sweep.

mod builder;

pub use builder::{FeatureBuilder, FeatureConfig};
