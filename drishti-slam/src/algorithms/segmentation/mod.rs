//! Scan segmentation.
//!
//! Splits a [`ScanFrame`](crate::core::types::ScanFrame) into runs of
//! contiguous readings separated by range jumps, invalid readings and
//! (optionally) corners.
//!
//! # Example
//!
//! ```rust,ignore
//! use drishti_slam::algorithms::segmentation::{Segmenter, SegmenterConfig};
//!
//! let segmenter = Segmenter::new(SegmenterConfig::default());
//! for segment in segmenter.segment(&frame) {
//!     println!("{:.3}..{:.3} rad", segment.start_angle, segment.end_angle);
//! }
//! ```

mod corners;
mod segmenter;

pub use corners::{find_corners, turn_angle};
pub use segmenter::{Segmenter, SegmenterConfig, curvature_indicator};
