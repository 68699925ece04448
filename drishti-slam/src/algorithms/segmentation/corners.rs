//! Corner detection along runs of contiguous readings.
//!
//! The turn angle at a reading is the heading change between the chord
//! arriving from `window` readings earlier and the chord leaving toward
//! `window` readings later. Corners are local maxima of the turn angle.

use rayon::prelude::*;

use crate::core::math::angle_diff;
use crate::core::types::Point2D;

/// Absolute heading change at `center` between the chords from `before`
/// and toward `after`, in [0, π].
#[inline]
pub fn turn_angle(before: Point2D, center: Point2D, after: Point2D) -> f32 {
    let incoming = (center - before).angle();
    let outgoing = (after - center).angle();
    angle_diff(incoming, outgoing).abs()
}

/// Indices (into `points`) of corners along one run of valid readings.
///
/// A reading qualifies when its turn angle exceeds `threshold` and is the
/// largest within `window` readings on either side; ties go to the first.
/// Readings closer than `window` to either end of the run are never
/// corners.
pub fn find_corners(points: &[Point2D], window: usize, threshold: f32) -> Vec<usize> {
    if window == 0 || points.len() < 2 * window + 1 {
        return Vec::new();
    }

    let first = window;
    let last = points.len() - 1 - window;
    let turns: Vec<f32> = (first..=last)
        .into_par_iter()
        .map(|i| turn_angle(points[i - window], points[i], points[i + window]))
        .collect();

    let mut corners = Vec::new();
    for (k, &turn) in turns.iter().enumerate() {
        if turn <= threshold {
            continue;
        }
        let lo = k.saturating_sub(window);
        let hi = (k + window).min(turns.len() - 1);
        let dominates_left = turns[lo..k].iter().all(|&t| turn > t);
        let dominates_right = turns[k + 1..=hi].iter().all(|&t| turn >= t);
        if dominates_left && dominates_right {
            corners.push(k + first);
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn l_shape() -> Vec<Point2D> {
        // Up the x = 2 wall, then left along y = 2
        let mut points: Vec<Point2D> = (0..20).map(|i| Point2D::new(2.0, i as f32 * 0.1)).collect();
        points.extend((1..20).map(|i| Point2D::new(2.0 - i as f32 * 0.1, 1.9)));
        points
    }

    #[test]
    fn test_turn_angle() {
        let turn = turn_angle(
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
        );
        assert_relative_eq!(turn, FRAC_PI_2, epsilon = 1e-6);

        let straight = turn_angle(
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(2.0, 0.0),
        );
        assert_relative_eq!(straight, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_corner_found() {
        let points = l_shape();
        let corners = find_corners(&points, 4, std::f32::consts::FRAC_PI_3);
        assert_eq!(corners, vec![19]);
    }

    #[test]
    fn test_straight_run_has_no_corner() {
        let points: Vec<Point2D> = (0..30).map(|i| Point2D::new(2.0, i as f32 * 0.05)).collect();
        assert!(find_corners(&points, 5, std::f32::consts::FRAC_PI_3).is_empty());
    }

    #[test]
    fn test_short_run() {
        let points = vec![Point2D::default(); 6];
        assert!(find_corners(&points, 3, 0.5).is_empty());
    }
}
