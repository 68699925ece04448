//! Angular arithmetic for scan geometry and pose estimation.
//!
//! Everything here wraps correctly across the ±π boundary. Means of angles
//! are computed on the unit circle (sum of sin/cos), never arithmetically.

use std::f32::consts::{PI, TAU};

/// Resultant lengths below this are treated as "no preferred direction".
const MIN_RESULTANT: f32 = 1e-6;

/// Normalize angle to [-π, π].
///
/// # Example
/// ```
/// use drishti_slam::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-6);
/// assert!((normalize_angle(-3.0 * PI) - (-PI)).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

/// Shortest angular difference from angle `a` to angle `b`.
///
/// Returns the signed angle you need to add to `a` to reach `b`.
///
/// ```
/// use drishti_slam::core::math::angle_diff;
/// use std::f32::consts::PI;
///
/// let diff = angle_diff(PI - 0.1, -PI + 0.1);
/// assert!((diff - 0.2).abs() < 1e-6);
/// ```
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}

/// Interpolate from `a` toward `b` along the shorter arc.
///
/// `t = 0` returns `a`, `t = 1` returns `b`.
#[inline]
pub fn angle_lerp(a: f32, b: f32, t: f32) -> f32 {
    normalize_angle(a + angle_diff(a, b) * t)
}

/// Circular mean of a set of angles.
///
/// Returns `None` for an empty set or when the angles cancel out
/// (e.g. two opposite directions).
pub fn circular_mean<I>(angles: I) -> Option<f32>
where
    I: IntoIterator<Item = f32>,
{
    weighted_circular_mean(angles.into_iter().map(|a| (a, 1.0)))
}

/// Weighted circular mean of `(angle, weight)` pairs.
///
/// Returns `None` when the total weight is zero or the resultant vector
/// vanishes.
pub fn weighted_circular_mean<I>(samples: I) -> Option<f32>
where
    I: IntoIterator<Item = (f32, f32)>,
{
    let mut sum_sin = 0.0f32;
    let mut sum_cos = 0.0f32;
    let mut total = 0.0f32;

    for (angle, weight) in samples {
        let (s, c) = angle.sin_cos();
        sum_sin += weight * s;
        sum_cos += weight * c;
        total += weight;
    }

    if total <= 0.0 {
        return None;
    }
    let resultant = (sum_sin * sum_sin + sum_cos * sum_cos).sqrt() / total;
    if resultant < MIN_RESULTANT {
        return None;
    }
    Some(sum_sin.atan2(sum_cos))
}

/// Counter-clockwise span of the interval that starts at `start` and ends
/// at `end`, in [0, 2π).
#[inline]
pub fn ccw_span(start: f32, end: f32) -> f32 {
    (end - start).rem_euclid(TAU)
}

/// Whether `angle` lies inside the counter-clockwise interval `[start, end]`.
///
/// ```
/// use drishti_slam::core::math::ccw_contains;
/// use std::f32::consts::{FRAC_PI_2, PI};
///
/// // From +90° CCW to -90° passes through 180°
/// assert!(ccw_contains(FRAC_PI_2, -FRAC_PI_2, PI));
/// assert!(!ccw_contains(FRAC_PI_2, -FRAC_PI_2, 0.0));
/// ```
#[inline]
pub fn ccw_contains(start: f32, end: f32, angle: f32) -> bool {
    ccw_span(start, angle) <= ccw_span(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_normalize_angle_wrap() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
        assert_relative_eq!(normalize_angle(2.0 * PI), 0.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(-2.0 * PI), 0.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(PI + 0.001), -PI + 0.001, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_diff_crossing_pi() {
        assert_relative_eq!(angle_diff(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-6);
        assert_relative_eq!(angle_diff(-PI + 0.1, PI - 0.1), -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_angle_lerp_crossing_pi() {
        let result = angle_lerp(PI - 0.1, -PI + 0.1, 0.5);
        assert_relative_eq!(result.abs(), PI, epsilon = 1e-5);
    }

    #[test]
    fn test_circular_mean_wraps() {
        // Arithmetic mean would give 0, the circular mean is ±π
        let mean = circular_mean([PI - 0.1, -PI + 0.1]).unwrap();
        assert_relative_eq!(mean.abs(), PI, epsilon = 1e-5);

        let mean = circular_mean([0.1, -0.1, 0.3]).unwrap();
        assert!(mean > 0.0 && mean < 0.2, "mean = {}", mean);
    }

    #[test]
    fn test_circular_mean_degenerate() {
        assert!(circular_mean(std::iter::empty()).is_none());
        assert!(circular_mean([0.0, PI]).is_none());
    }

    #[test]
    fn test_weighted_circular_mean() {
        let mean = weighted_circular_mean([(0.0, 3.0), (FRAC_PI_2, 1.0)]).unwrap();
        assert!(mean > 0.0 && mean < FRAC_PI_2 / 2.0);
        assert!(weighted_circular_mean([(1.0, 0.0)]).is_none());
    }

    #[test]
    fn test_ccw_contains() {
        assert!(ccw_contains(-0.5, 0.5, 0.0));
        assert!(!ccw_contains(-0.5, 0.5, PI));
        // Interval wrapping through ±π
        assert!(ccw_contains(PI - 0.2, -PI + 0.2, PI));
        assert!(!ccw_contains(PI - 0.2, -PI + 0.2, 0.0));
    }

    #[test]
    fn test_ccw_span() {
        assert_relative_eq!(ccw_span(FRAC_PI_2, -FRAC_PI_2), PI, epsilon = 1e-6);
        assert_relative_eq!(ccw_span(-FRAC_PI_2, FRAC_PI_2), PI, epsilon = 1e-6);
        assert_relative_eq!(ccw_span(0.0, 0.0), 0.0);
    }
}
