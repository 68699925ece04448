//! Range frame segmentation.
//!
//! Each pair of adjacent readings gets a curvature indicator: the apparent
//! incidence angle of the surface between them,
//!
//! ```text
//! indicator = atan2(|r[i+1] - r[i]|, min(r[i], r[i+1]) · |Δθ|)
//! ```
//!
//! which stays near the true incidence angle on a continuous surface and
//! approaches π/2 across a depth jump. Indicators are computed in parallel;
//! segments are then formed by a single sequential walk.

use std::f32::consts::FRAC_PI_3;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::corners::find_corners;
use crate::core::math::circular_mean;
use crate::core::types::{Point2D, ScanFrame, ScanPoint};

/// Configuration for scan segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Curvature indicator above which a boundary is a discontinuity (radians).
    /// Typical: 1.3-1.5
    pub discontinuity_threshold: f32,

    /// Range difference below which a boundary is never a discontinuity,
    /// whatever the indicator (meters). Keeps range noise at grazing
    /// incidence from fragmenting walls.
    pub min_range_jump: f32,

    /// Segments with fewer readings are dropped.
    pub min_segment_readings: usize,

    /// Readings at each end used for the boundary direction averages.
    pub boundary_window: usize,

    /// Split segments at detected corners.
    pub split_at_corners: bool,

    /// Chord length, in readings, for the corner turn angle.
    pub corner_window: usize,

    /// Turn angle above which a local maximum is a corner (radians).
    pub corner_threshold: f32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            discontinuity_threshold: 1.4,
            min_range_jump: 0.1,
            min_segment_readings: 5,
            boundary_window: 4,
            split_at_corners: true,
            corner_window: 10,
            corner_threshold: FRAC_PI_3,
        }
    }
}

impl SegmenterConfig {
    /// Configuration for noisy scanners: longer chords, stricter jumps.
    pub fn noisy() -> Self {
        Self {
            discontinuity_threshold: 1.5,
            min_range_jump: 0.2,
            min_segment_readings: 8,
            boundary_window: 8,
            corner_window: 16,
            ..Default::default()
        }
    }

    /// Builder-style setter for corner splitting.
    pub fn with_split_at_corners(mut self, enabled: bool) -> Self {
        self.split_at_corners = enabled;
        self
    }
}

/// Apparent incidence angle between two adjacent readings, in [0, π/2].
#[inline]
pub fn curvature_indicator(r0: f32, r1: f32, angle_increment: f32) -> f32 {
    (r1 - r0).abs().atan2(r0.min(r1) * angle_increment.abs())
}

/// Splits range frames into [`ScanPoint`] segments.
///
/// A pure function of (frame, config): the same frame always yields the
/// same segments.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    /// Create a new segmenter.
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment a frame.
    ///
    /// Invalid readings always end the current segment. The first and last
    /// readings of the frame are field-of-view edges, not discontinuities.
    pub fn segment(&self, frame: &ScanFrame) -> Vec<ScanPoint> {
        let n = frame.len();
        if n < 2 {
            return Vec::new();
        }

        let points = Self::points(frame);
        let mut breaks = self.boundaries(frame);

        if self.config.split_at_corners {
            for corner in self.corners(&points, &breaks) {
                if corner < n - 1 {
                    breaks[corner] = true;
                }
            }
        }

        let mut segments = Vec::new();
        let mut start: Option<usize> = None;
        for i in 0..n {
            if points[i].is_none() {
                continue;
            }
            let first = *start.get_or_insert(i);
            if i < n - 1 && !breaks[i] {
                continue;
            }
            start = None;
            if let Some(segment) = self.build_segment(frame, &points, first, i) {
                segments.push(segment);
            }
        }

        log::trace!(
            "Segmented {} readings into {} segments",
            n,
            segments.len()
        );
        segments
    }

    /// Frame indices of corners, never across a discontinuity.
    pub fn detect_corners(&self, frame: &ScanFrame) -> Vec<usize> {
        if frame.len() < 2 {
            return Vec::new();
        }
        let points = Self::points(frame);
        let breaks = self.boundaries(frame);
        self.corners(&points, &breaks)
    }

    fn points(frame: &ScanFrame) -> Vec<Option<Point2D>> {
        (0..frame.len())
            .into_par_iter()
            .map(|i| frame.point_at(i))
            .collect()
    }

    /// `breaks[i]` is true when the boundary between readings i and i+1
    /// is a discontinuity.
    fn boundaries(&self, frame: &ScanFrame) -> Vec<bool> {
        (0..frame.len() - 1)
            .into_par_iter()
            .map(|i| match (frame.valid_range(i), frame.valid_range(i + 1)) {
                (Some(r0), Some(r1)) => {
                    (r1 - r0).abs() > self.config.min_range_jump
                        && curvature_indicator(r0, r1, frame.angle_increment)
                            > self.config.discontinuity_threshold
                }
                _ => true,
            })
            .collect()
    }

    fn corners(&self, points: &[Option<Point2D>], breaks: &[bool]) -> Vec<usize> {
        let mut corners = Vec::new();
        let mut run: Vec<Point2D> = Vec::new();
        let mut run_start = 0;

        for (i, point) in points.iter().enumerate() {
            let Some(p) = point else {
                continue;
            };
            if run.is_empty() {
                run_start = i;
            }
            run.push(*p);
            if i == points.len() - 1 || breaks[i] {
                corners.extend(
                    find_corners(&run, self.config.corner_window, self.config.corner_threshold)
                        .into_iter()
                        .map(|k| run_start + k),
                );
                run.clear();
            }
        }
        corners
    }

    fn build_segment(
        &self,
        frame: &ScanFrame,
        points: &[Option<Point2D>],
        first: usize,
        last: usize,
    ) -> Option<ScanPoint> {
        let reading_count = last - first + 1;
        if reading_count < self.config.min_segment_readings.max(2) {
            return None;
        }

        let pts: Vec<Point2D> = points[first..=last].iter().flatten().copied().collect();
        let count = pts.len();
        let window = self.config.boundary_window.clamp(1, count - 1);

        // Directions leaving the segment through each boundary
        let head = pts[0];
        let tail = pts[count - 1];
        let average_prev_angle = circular_mean((0..window).map(|j| (pts[j] - pts[j + 1]).angle()))
            .unwrap_or_else(|| (head - tail).angle());
        let average_next_angle = circular_mean(
            (count - 1 - window..count - 1).map(|j| (pts[j + 1] - pts[j]).angle()),
        )
        .unwrap_or_else(|| (tail - head).angle());

        let mid = first + (last - first) / 2;
        let mut segment = ScanPoint {
            angle_width: (last - first) as f32 * frame.angle_increment.abs(),
            start_angle: frame.angle_at(first),
            end_angle: frame.angle_at(last),
            average_prev_angle,
            average_next_angle,
            prev_discontinuity: first != 0,
            next_discontinuity: last != frame.len() - 1,
            first_index: first,
            last_index: last,
            reading_count,
            mid_angle: frame.angle_at(mid),
            mid_range: frame.ranges[mid],
        };

        // Clockwise scan: frame order runs against the CCW boundary order
        if frame.angle_increment < 0.0 {
            std::mem::swap(&mut segment.start_angle, &mut segment.end_angle);
            std::mem::swap(
                &mut segment.average_prev_angle,
                &mut segment.average_next_angle,
            );
            std::mem::swap(
                &mut segment.prev_discontinuity,
                &mut segment.next_discontinuity,
            );
        }
        Some(segment)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LaserGeometry;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn geometry(n: usize) -> LaserGeometry {
        LaserGeometry::uniform(n, -0.5, 0.5, 0.1, 10.0)
    }

    #[test]
    fn test_indicator() {
        // Equal ranges: surface perpendicular to the beam
        assert_relative_eq!(curvature_indicator(2.0, 2.0, 0.01), 0.0);
        // Large jump approaches π/2
        assert!(curvature_indicator(1.0, 3.0, 0.01) > 1.5);
        assert!(curvature_indicator(1.0, 3.0, 0.01) <= FRAC_PI_2);
    }

    #[test]
    fn test_single_arc() {
        let frame = ScanFrame::new(&geometry(50), vec![2.0; 50]);
        let segments = Segmenter::default().segment(&frame);
        assert_eq!(segments.len(), 1);
        let s = &segments[0];
        assert!(!s.prev_discontinuity && !s.next_discontinuity);
        assert_eq!(s.reading_count, 50);
        assert_relative_eq!(s.angle_width, 1.0, epsilon = 1e-5);
        assert_relative_eq!(s.start_angle, -0.5, epsilon = 1e-6);
        assert_relative_eq!(s.end_angle, 0.5, epsilon = 1e-5);
        assert_relative_eq!(s.mid_range, 2.0);
    }

    #[test]
    fn test_invalid_reading_terminates_segment() {
        let mut ranges = vec![2.0; 40];
        ranges[20] = 0.0;
        let frame = ScanFrame::new(&geometry(40), ranges);
        let segments = Segmenter::default().segment(&frame);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].last_index, 19);
        assert!(segments[0].next_discontinuity);
        assert_eq!(segments[1].first_index, 21);
        assert!(segments[1].prev_discontinuity);
    }

    #[test]
    fn test_short_segments_dropped() {
        let mut ranges = vec![0.0; 40];
        for r in ranges.iter_mut().take(13).skip(10) {
            *r = 2.0;
        }
        let frame = ScanFrame::new(&geometry(40), ranges);
        assert!(Segmenter::default().segment(&frame).is_empty());
    }

    #[test]
    fn test_no_valid_readings() {
        let frame = ScanFrame::new(&geometry(40), vec![f32::NAN; 40]);
        assert!(Segmenter::default().segment(&frame).is_empty());
        let empty = ScanFrame::new(&geometry(0), Vec::new());
        assert!(Segmenter::default().segment(&empty).is_empty());
    }

    #[test]
    fn test_boundary_directions_on_flat_wall() {
        // Wall x = 2 seen across ±0.5 rad
        let g = geometry(101);
        let ranges = (0..101).map(|i| 2.0 / g.angle_at(i).cos()).collect();
        let frame = ScanFrame::new(&g, ranges);
        let segments = Segmenter::default().segment(&frame);
        assert_eq!(segments.len(), 1);
        // Start boundary points down the wall, end boundary up the wall
        assert_relative_eq!(segments[0].average_prev_angle, -FRAC_PI_2, epsilon = 1e-3);
        assert_relative_eq!(segments[0].average_next_angle, FRAC_PI_2, epsilon = 1e-3);
    }

    #[test]
    fn test_boundary_mean_wraps_across_pi() {
        // Wall y = 2 seen across π/2 ± 0.3: readings run right to left,
        // so the end boundary direction sits on the ±π seam
        let g = LaserGeometry::uniform(61, FRAC_PI_2 - 0.3, FRAC_PI_2 + 0.3, 0.1, 10.0);
        let ranges = (0..61).map(|i| 2.0 / g.angle_at(i).sin()).collect();
        let frame = ScanFrame::new(&g, ranges);
        let segments = Segmenter::default().segment(&frame);
        assert_eq!(segments.len(), 1);
        assert_relative_eq!(segments[0].average_prev_angle, 0.0, epsilon = 1e-3);
        assert_relative_eq!(segments[0].average_next_angle.abs(), PI, epsilon = 1e-3);
    }

    #[test]
    fn test_clockwise_scan_keeps_ccw_boundaries() {
        // Same wall x = 2, readings running from +0.5 down to -0.5
        let g = LaserGeometry::uniform(101, 0.5, -0.5, 0.1, 10.0);
        assert!(g.angle_increment < 0.0);
        let mut ranges: Vec<f32> = (0..101).map(|i| 2.0 / g.angle_at(i).cos()).collect();
        // Invalid end readings make both boundaries discontinuities
        ranges[0] = 0.0;
        ranges[100] = 0.0;
        let frame = ScanFrame::new(&g, ranges);
        let segments = Segmenter::default().segment(&frame);
        assert_eq!(segments.len(), 1);
        let s = &segments[0];
        assert!(s.prev_discontinuity && s.next_discontinuity);
        assert!(s.start_angle < s.end_angle);
        assert_relative_eq!(s.average_prev_angle, -FRAC_PI_2, epsilon = 1e-3);
        assert_relative_eq!(s.average_next_angle, FRAC_PI_2, epsilon = 1e-3);
    }

    #[test]
    fn test_clockwise_scan_swaps_field_of_view_edges() {
        let g = LaserGeometry::uniform(60, 0.5, -0.5, 0.1, 10.0);
        let mut ranges = vec![2.0; 60];
        ranges[20] = 0.0;
        let frame = ScanFrame::new(&g, ranges);
        let segments = Segmenter::default().segment(&frame);
        assert_eq!(segments.len(), 2);
        // Frame-first segment lies counter-clockwise of the gap
        assert!(segments[0].prev_discontinuity && !segments[0].next_discontinuity);
        assert!(!segments[1].prev_discontinuity && segments[1].next_discontinuity);
    }

    #[test]
    fn test_deterministic() {
        let g = geometry(200);
        let ranges = (0..200)
            .map(|i| if (60..120).contains(&i) { 1.0 + 0.001 * i as f32 } else { 3.0 })
            .collect();
        let frame = ScanFrame::new(&g, ranges);
        let segmenter = Segmenter::default();
        let first = segmenter.segment(&frame);
        for _ in 0..5 {
            assert_eq!(segmenter.segment(&frame), first);
        }
    }
}
