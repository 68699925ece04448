//! Scan frame validation.
//!
//! Ingest is the leaf of the pipeline: it never modifies a frame, it only
//! decides whether the frame is well formed. Individual out-of-band readings
//! are not an error; they are skipped later by the segmenter.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::types::{OdometryDelta, ScanFrame};
use crate::error::FrameError;

/// Check the structural integrity of a frame.
pub fn validate_frame(frame: &ScanFrame) -> Result<(), FrameError> {
    if frame.ranges.is_empty() {
        return Err(FrameError::Empty);
    }
    if frame.ranges.len() != frame.distance_count {
        return Err(FrameError::CountMismatch {
            declared: frame.distance_count,
            received: frame.ranges.len(),
        });
    }
    if !frame.angle_increment.is_finite() || frame.angle_increment == 0.0 {
        return Err(FrameError::InvalidIncrement(frame.angle_increment));
    }
    if !frame.angle_start.is_finite() {
        return Err(FrameError::InvalidStartAngle(frame.angle_start));
    }
    let (minimum, maximum) = (frame.minimum_distance, frame.maximum_distance);
    if !minimum.is_finite() || !maximum.is_finite() || minimum < 0.0 || minimum >= maximum {
        return Err(FrameError::InvalidDistanceBounds { minimum, maximum });
    }
    Ok(())
}

/// Check that an odometry delta is usable.
pub fn validate_odometry(delta: &OdometryDelta) -> Result<(), FrameError> {
    if delta.is_finite() {
        Ok(())
    } else {
        Err(FrameError::InvalidOdometry)
    }
}

/// Validating entry point with accepted/dropped counters.
///
/// Counters are atomic so the ingest can be shared between the producer
/// thread and readers.
#[derive(Debug, Default)]
pub struct FrameIngest {
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl FrameIngest {
    /// Create an ingest with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a frame and its odometry, counting the outcome.
    pub fn accept(&self, frame: &ScanFrame, odometry: &OdometryDelta) -> Result<(), FrameError> {
        let result = validate_frame(frame).and_then(|_| validate_odometry(odometry));
        match &result {
            Ok(()) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                log::warn!("Dropping scan frame ({}), {} dropped so far", e, dropped);
            }
        }
        result
    }

    /// Frames that passed validation.
    pub fn accepted_frames(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Frames rejected by validation.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LaserGeometry, Pose2D};

    fn frame() -> ScanFrame {
        let g = LaserGeometry::uniform(4, -0.1, 0.1, 0.1, 10.0);
        ScanFrame::new(&g, vec![1.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn test_valid_frame() {
        assert!(validate_frame(&frame()).is_ok());
    }

    #[test]
    fn test_out_of_band_readings_are_not_fatal() {
        let mut f = frame();
        f.ranges = vec![0.0, f32::NAN, 100.0, f32::INFINITY];
        assert!(validate_frame(&f).is_ok());
    }

    #[test]
    fn test_malformed_frames() {
        let mut f = frame();
        f.ranges.pop();
        assert_eq!(
            validate_frame(&f),
            Err(FrameError::CountMismatch {
                declared: 4,
                received: 3
            })
        );

        let mut f = frame();
        f.ranges.clear();
        assert_eq!(validate_frame(&f), Err(FrameError::Empty));

        let mut f = frame();
        f.angle_increment = 0.0;
        assert!(matches!(validate_frame(&f), Err(FrameError::InvalidIncrement(_))));

        let mut f = frame();
        f.angle_increment = f32::NAN;
        assert!(matches!(validate_frame(&f), Err(FrameError::InvalidIncrement(_))));

        let mut f = frame();
        f.minimum_distance = 20.0;
        assert!(matches!(
            validate_frame(&f),
            Err(FrameError::InvalidDistanceBounds { .. })
        ));
    }

    #[test]
    fn test_ingest_counters() {
        let ingest = FrameIngest::new();
        let odom = Pose2D::identity();
        assert!(ingest.accept(&frame(), &odom).is_ok());

        let mut bad = frame();
        bad.distance_count = 99;
        assert!(ingest.accept(&bad, &odom).is_err());
        assert!(
            ingest
                .accept(&frame(), &Pose2D::new(f32::NAN, 0.0, 0.0))
                .is_err()
        );

        assert_eq!(ingest.accepted_frames(), 1);
        assert_eq!(ingest.dropped_frames(), 2);
    }
}
