//! Default value functions for serde deserialization.

use std::f32::consts::PI;

pub fn distance_count() -> usize {
    1081
}

pub fn angle_start() -> f32 {
    -0.75 * PI
}

pub fn angle_width() -> f32 {
    1.5 * PI
}

pub fn minimum_distance() -> f32 {
    0.1
}

pub fn maximum_distance() -> f32 {
    30.0
}

pub fn distance_accuracy() -> f32 {
    0.03
}

pub fn meters_per_tick() -> f32 {
    0.000_348_342_86
}

pub fn base_width() -> f32 {
    0.4572
}

pub fn max_pass_latency_ms() -> u64 {
    100
}
