//! Vector landmark map.
//!
//! Space is divided into square regions no smaller than the fusion radius.
//! Regions hash onto a fixed set of mutex stripes; a fuse call locks the
//! stripes covering the 3×3 region block around its observation, in
//! ascending stripe order. Nearly coincident observations fused in
//! parallel therefore serialize, while distant ones proceed concurrently.
//!
//! Readers take an immutable [`MapSnapshot`] instead of locking.
//!
//! # Example
//!
//! ```rust,ignore
//! use drishti_slam::algorithms::mapping::{VectorMap, VectorMapConfig};
//!
//! let map = VectorMap::new(VectorMapConfig::default());
//! map.fuse_all(&observations);
//!
//! let snapshot = map.snapshot();
//! let target = snapshot.nearest_matchable(position, 0.3);
//! ```

mod region;
mod snapshot;
mod vector_map;

pub use region::RegionKey;
pub use snapshot::{MapSnapshot, MapStats};
pub use vector_map::{FuseOutcome, VectorMap, VectorMapConfig};
