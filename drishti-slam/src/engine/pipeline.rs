//! The per-frame perception pass.
//!
//! ```text
//! ScanFrame ──► ingest ──► segment ──► predict ──► features ──► weigh ──► resample
//!                                                                            │
//!                              publish ◄── fuse into map ◄── commit particles ┘
//! ```
//!
//! Each stage completes before the next starts. Weighting reads the map
//! snapshot taken when the pass began, so fusion from this frame never
//! influences its own weights.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::algorithms::features::{FeatureBuilder, FeatureConfig};
use crate::algorithms::localization::{ParticleFilter, ParticleFilterConfig, PoseCovariance};
use crate::algorithms::mapping::{FuseOutcome, MapSnapshot, VectorMap, VectorMapConfig};
use crate::algorithms::segmentation::{Segmenter, SegmenterConfig};
use crate::core::types::{LaserGeometry, OdometryDelta, Particle, Pose2D, ScanFrame};
use crate::error::Result;
use crate::sensors::FrameIngest;

use super::cancel::CancelToken;

/// Stage configuration for a [`Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Expected scanner geometry
    pub geometry: LaserGeometry,
    /// Segmentation thresholds
    pub segmenter: SegmenterConfig,
    /// Observation uncertainty
    pub features: FeatureConfig,
    /// Map fusion
    pub map: VectorMapConfig,
    /// Particle filter
    pub filter: ParticleFilterConfig,
}

/// Everything a reader needs from the latest committed frame.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Best pose estimate
    pub pose: Pose2D,
    /// Spread of the particle set
    pub covariance: PoseCovariance,
    /// Committed particle set
    pub particles: Arc<[Particle]>,
    /// Map after fusing this frame
    pub map: Arc<MapSnapshot>,
    /// Number of frames committed so far (0 before the first)
    pub frame_index: u64,
}

/// Summary of one committed pass.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// Index of the committed frame (1-based)
    pub frame_index: u64,
    /// Pose estimate of the weighted set
    pub pose: Pose2D,
    /// Segments found
    pub segments: usize,
    /// Observations built
    pub observations: usize,
    /// Observations fused into existing map points
    pub fused: usize,
    /// Observations inserted as new map points
    pub inserted: usize,
    /// Markers skipped by fusion
    pub skipped: usize,
    /// Effective particle count after weighting
    pub neff: f64,
    /// Whether the particle set was resampled
    pub resampled: bool,
    /// Wall time of the pass
    pub elapsed: Duration,
}

/// Scan-to-pose perception pipeline.
///
/// Passes are serialized on the particle filter; readers never block a
/// pass and always see a fully committed [`PipelineOutput`].
pub struct Pipeline {
    config: PipelineConfig,
    ingest: FrameIngest,
    segmenter: Segmenter,
    builder: FeatureBuilder,
    map: VectorMap,
    filter: Mutex<ParticleFilter>,
    output: RwLock<Arc<PipelineOutput>>,
    frames: AtomicU64,
}

impl Pipeline {
    /// Create a pipeline starting at the origin.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_initial_pose(config, Pose2D::identity())
    }

    /// Create a pipeline with particles spread around `pose`.
    pub fn with_initial_pose(config: PipelineConfig, pose: Pose2D) -> Self {
        let filter = ParticleFilter::new(config.filter.clone(), pose);
        let map = VectorMap::new(config.map.clone());
        let output = PipelineOutput {
            pose: filter.estimate(),
            covariance: filter.covariance(),
            particles: filter.particles().clone(),
            map: map.snapshot(),
            frame_index: 0,
        };

        log::info!(
            "Pipeline created: {} particles, match radius {:.2}m, {} map stripes",
            config.filter.num_particles,
            config.map.match_radius,
            config.map.region_stripes
        );

        Self {
            ingest: FrameIngest::new(),
            segmenter: Segmenter::new(config.segmenter.clone()),
            builder: FeatureBuilder::new(config.features.clone()),
            map,
            filter: Mutex::new(filter),
            output: RwLock::new(Arc::new(output)),
            frames: AtomicU64::new(0),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Expected scanner geometry, for producers building frames.
    pub fn geometry(&self) -> &LaserGeometry {
        &self.config.geometry
    }

    /// Latest committed output.
    pub fn output(&self) -> Arc<PipelineOutput> {
        self.output.read().clone()
    }

    /// The live vector map.
    pub fn map(&self) -> &VectorMap {
        &self.map
    }

    /// Frames rejected by validation.
    pub fn dropped_frames(&self) -> u64 {
        self.ingest.dropped_frames()
    }

    /// Frames committed.
    pub fn committed_frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Run a full pass for one frame.
    pub fn process(&self, frame: &ScanFrame, odometry: &OdometryDelta) -> Result<FrameReport> {
        self.process_cancellable(frame, odometry, &CancelToken::new())
    }

    /// Run a pass that may be abandoned between stages.
    ///
    /// A cancelled pass returns
    /// [`PipelineError::Cancelled`](crate::error::PipelineError::Cancelled)
    /// and leaves the particle set, map and published output untouched.
    pub fn process_cancellable(
        &self,
        frame: &ScanFrame,
        odometry: &OdometryDelta,
        cancel: &CancelToken,
    ) -> Result<FrameReport> {
        let started = Instant::now();
        self.ingest.accept(frame, odometry)?;

        let mut filter = self.filter.lock();
        let map = self.map.snapshot();
        let checkpoint = |stage: &str| -> Result<()> {
            cancel.check().inspect_err(|_| {
                log::warn!("Pass cancelled before {}", stage);
            })
        };

        checkpoint("segmentation")?;
        let t = Instant::now();
        let segments = self.segmenter.segment(frame);
        log::trace!("segment: {} segments in {:?}", segments.len(), t.elapsed());

        checkpoint("prediction")?;
        let t = Instant::now();
        let predicted = filter.predict(odometry);
        let observations = self.builder.build(&segments, &predicted.estimate());
        log::trace!(
            "predict+features: {} observations in {:?}",
            observations.len(),
            t.elapsed()
        );

        checkpoint("weighting")?;
        let t = Instant::now();
        let weighted = filter.weigh(predicted, &observations, &map);
        let pose = weighted.estimate();
        let neff = weighted.neff();
        log::trace!("weigh: neff {:.1} in {:?}", neff, t.elapsed());

        checkpoint("resampling")?;
        let update = filter.resample(weighted);
        let resampled = update.resampled();

        checkpoint("commit")?;
        filter.commit(update);

        let t = Instant::now();
        let placed: Vec<_> = observations.iter().map(|o| o.relocate(&pose)).collect();
        let outcomes = self.map.fuse_all(&placed);
        let (mut fused, mut inserted, mut skipped) = (0, 0, 0);
        for outcome in &outcomes {
            match outcome {
                FuseOutcome::Fused { .. } => fused += 1,
                FuseOutcome::Inserted { .. } => inserted += 1,
                FuseOutcome::Skipped => skipped += 1,
            }
        }
        log::trace!(
            "fuse: {} fused, {} inserted in {:?}",
            fused,
            inserted,
            t.elapsed()
        );

        let frame_index = self.frames.fetch_add(1, Ordering::AcqRel) + 1;
        let output = PipelineOutput {
            pose,
            covariance: filter.covariance(),
            particles: filter.particles().clone(),
            map: self.map.snapshot(),
            frame_index,
        };
        *self.output.write() = Arc::new(output);
        drop(filter);

        let report = FrameReport {
            frame_index,
            pose,
            segments: segments.len(),
            observations: observations.len(),
            fused,
            inserted,
            skipped,
            neff,
            resampled,
            elapsed: started.elapsed(),
        };
        log::debug!(
            "Frame {}: pose ({:.3}, {:.3}, {:.3}), {} segments, map {} points, {:?}",
            frame_index,
            pose.x,
            pose.y,
            pose.theta,
            report.segments,
            self.map.len(),
            report.elapsed
        );
        Ok(report)
    }

    /// Re-seed the particle set around `pose`; the map is kept.
    pub fn reset_pose(&self, pose: Pose2D) {
        let mut filter = self.filter.lock();
        filter.reset(pose);
        let current = self.output();
        let output = PipelineOutput {
            pose: filter.estimate(),
            covariance: filter.covariance(),
            particles: filter.particles().clone(),
            map: current.map.clone(),
            frame_index: current.frame_index,
        };
        *self.output.write() = Arc::new(output);
        log::info!(
            "Pose reset to ({:.3}, {:.3}, {:.3})",
            pose.x,
            pose.y,
            pose.theta
        );
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("frames", &self.committed_frames())
            .field("dropped", &self.dropped_frames())
            .field("map_points", &self.map.len())
            .finish()
    }
}
