//! Test utilities for DrishtiSLAM integration tests.
//!
//! Scenes are built from wall segments and scanned with the simulated
//! LIDAR, so every test has exact ground truth.

#![allow(dead_code)]

use drishti_slam::algorithms::localization::MotionModelConfig;
use drishti_slam::{
    LaserGeometry, Observation, ParticleFilterConfig, PipelineConfig, Point2D, Pose2D,
    SegmenterConfig, SimulatedLidar, Sweep, WallSegment,
};

/// Install a test logger once per binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A single flat wall at x = 2 spanning y in [-1.5, 1.5].
pub fn single_wall() -> Vec<WallSegment> {
    vec![WallSegment::new(
        Point2D::new(2.0, -1.5),
        Point2D::new(2.0, 1.5),
    )]
}

/// Two walls meeting at (2, 2): x = 2 for y in [-3, 2], y = 2 for x in [-3, 2].
pub fn room_corner() -> Vec<WallSegment> {
    vec![
        WallSegment::new(Point2D::new(2.0, -3.0), Point2D::new(2.0, 2.0)),
        WallSegment::new(Point2D::new(2.0, 2.0), Point2D::new(-3.0, 2.0)),
    ]
}

/// Rectangular room with corners at (x0, y0) and (x1, y1).
pub fn room(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<WallSegment> {
    let a = Point2D::new(x0, y0);
    let b = Point2D::new(x1, y0);
    let c = Point2D::new(x1, y1);
    let d = Point2D::new(x0, y1);
    vec![
        WallSegment::new(a, b),
        WallSegment::new(b, c),
        WallSegment::new(c, d),
        WallSegment::new(d, a),
    ]
}

/// Short wall pieces centred on `centers`, each facing the origin.
///
/// Each piece is small enough that the middle reading of its segment stays
/// within a few centimetres of the centre while the robot moves nearby.
pub fn pillars(centers: &[Point2D], width: f32) -> Vec<WallSegment> {
    centers
        .iter()
        .map(|c| {
            let len = c.length();
            let across = Point2D::new(-c.y / len, c.x / len);
            let half = Point2D::new(across.x * width / 2.0, across.y * width / 2.0);
            WallSegment::new(*c - half, *c + half)
        })
        .collect()
}

/// UTM-30LX scanner over the given walls with seeded range noise.
pub fn utm_lidar(walls: Vec<WallSegment>, noise: f32, seed: u64) -> SimulatedLidar {
    SimulatedLidar::new(LaserGeometry::utm_30lx(), walls).with_noise(noise, seed)
}

/// Pipeline configuration for a tracking run with a fixed seed.
pub fn tracking_config(num_particles: usize, seed: u64) -> PipelineConfig {
    PipelineConfig {
        geometry: LaserGeometry::utm_30lx(),
        segmenter: SegmenterConfig::noisy(),
        filter: ParticleFilterConfig {
            num_particles,
            motion: MotionModelConfig::low_noise(),
            ..ParticleFilterConfig::tracking()
        }
        .with_seed(seed),
        ..Default::default()
    }
}

/// Observation at a world position with a complete sweep facing the origin.
pub fn facing_origin(x: f32, y: f32, sigma: f32) -> Observation {
    let local = Point2D::new(x, y);
    let back = local.angle() + std::f32::consts::PI;
    let sweep = Sweep::new(Some(back - 0.4), Some(back + 0.4));
    Observation::new(local, sweep, sigma, sigma, &Pose2D::identity())
}
