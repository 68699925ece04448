//! Concurrent landmark map with per-region fusion.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Mutex, MutexGuard};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::types::{MapPoint, Observation, Point2D};

use super::region::RegionKey;
use super::snapshot::MapSnapshot;

/// Configuration for the vector map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorMapConfig {
    /// Observations within this distance of a point fuse into it (meters).
    /// Also the side of the locking regions.
    pub match_radius: f32,

    /// Sweep bounds further apart than this conflict (radians).
    pub sweep_tolerance: f32,

    /// Number of mutex stripes regions hash onto.
    pub region_stripes: usize,
}

impl Default for VectorMapConfig {
    fn default() -> Self {
        Self {
            match_radius: 0.15,
            sweep_tolerance: 0.35,
            region_stripes: 64,
        }
    }
}

/// Result of fusing one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseOutcome {
    /// Merged into the existing point `id`.
    Fused {
        /// Updated point
        id: u64,
    },
    /// Created a new point `id`.
    Inserted {
        /// New point
        id: u64,
    },
    /// Marker or non-finite observation; map unchanged.
    Skipped,
}

type RegionTable = HashMap<RegionKey, Vec<MapPoint>>;

/// Stripe guards held for one operation, sorted by stripe index.
struct LockedRegions<'a> {
    stripe_count: usize,
    indices: Vec<usize>,
    guards: Vec<MutexGuard<'a, RegionTable>>,
}

impl LockedRegions<'_> {
    fn slot(&self, key: RegionKey) -> Option<usize> {
        self.indices.binary_search(&key.stripe(self.stripe_count)).ok()
    }

    fn region(&self, key: RegionKey) -> Option<&Vec<MapPoint>> {
        self.slot(key).and_then(|s| self.guards[s].get(&key))
    }

    fn take(&mut self, key: RegionKey, index: usize) -> Option<MapPoint> {
        let slot = self.slot(key)?;
        let table = &mut self.guards[slot];
        let region = table.get_mut(&key)?;
        let point = (index < region.len()).then(|| region.swap_remove(index));
        if region.is_empty() {
            table.remove(&key);
        }
        point
    }

    fn put(&mut self, key: RegionKey, point: MapPoint) -> bool {
        match self.slot(key) {
            Some(slot) => {
                self.guards[slot].entry(key).or_default().push(point);
                true
            }
            None => false,
        }
    }
}

/// Growable set of fused landmarks.
///
/// Points are only ever created or fused, never removed. All operations
/// take `&self`; the map can be shared across threads.
pub struct VectorMap {
    config: VectorMapConfig,
    inv_region_size: f32,
    stripes: Box<[Mutex<RegionTable>]>,
    next_id: AtomicU64,
    len: AtomicUsize,
}

impl VectorMap {
    /// Create an empty map.
    pub fn new(config: VectorMapConfig) -> Self {
        let stripe_count = config.region_stripes.max(1);
        let stripes = (0..stripe_count)
            .map(|_| Mutex::new(RegionTable::new()))
            .collect();
        Self {
            inv_region_size: 1.0 / config.match_radius,
            config,
            stripes,
            next_id: AtomicU64::new(0),
            len: AtomicUsize::new(0),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &VectorMapConfig {
        &self.config
    }

    /// Number of map points.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// True if the map holds no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the stripes owning `keys` in ascending stripe order.
    fn lock<I>(&self, keys: I) -> LockedRegions<'_>
    where
        I: IntoIterator<Item = RegionKey>,
    {
        let stripe_count = self.stripes.len();
        let mut indices: Vec<usize> = keys.into_iter().map(|k| k.stripe(stripe_count)).collect();
        indices.sort_unstable();
        indices.dedup();
        let guards = indices.iter().map(|&i| self.stripes[i].lock()).collect();
        LockedRegions {
            stripe_count,
            indices,
            guards,
        }
    }

    fn region_of(&self, position: Point2D) -> RegionKey {
        RegionKey::containing(position, self.inv_region_size)
    }

    /// Fuse one observation.
    ///
    /// The nearest point within `match_radius` absorbs the observation;
    /// otherwise a new point is inserted with `count = 1`. Marker
    /// observations are skipped.
    pub fn fuse(&self, obs: &Observation) -> FuseOutcome {
        if obs.is_marker() || !obs.position.is_finite() {
            return FuseOutcome::Skipped;
        }

        let key = self.region_of(obs.position);
        let block = key.block();
        let mut locked = self.lock(block);

        let radius2 = self.config.match_radius * self.config.match_radius;
        let mut best: Option<(RegionKey, usize, f32)> = None;
        for region in block {
            let Some(points) = locked.region(region) else {
                continue;
            };
            for (i, p) in points.iter().enumerate() {
                let d2 = p.position.distance_squared(&obs.position);
                if d2 <= radius2 && best.is_none_or(|(_, _, b)| d2 < b) {
                    best = Some((region, i, d2));
                }
            }
        }

        if let Some((region, index, _)) = best
            && let Some(mut point) = locked.take(region, index)
        {
            point.fuse(obs, self.config.sweep_tolerance);
            let id = point.id;
            // A fused point stays within match_radius of the observation,
            // so its new region is inside the locked block
            let moved_to = self.region_of(point.position);
            let target = if block.contains(&moved_to) { moved_to } else { region };
            locked.put(target, point);
            return FuseOutcome::Fused { id };
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if locked.put(key, MapPoint::from_observation(id, obs)) {
            self.len.fetch_add(1, Ordering::AcqRel);
            log::trace!(
                "Inserted map point {} at ({:.3}, {:.3})",
                id,
                obs.position.x,
                obs.position.y
            );
        }
        FuseOutcome::Inserted { id }
    }

    /// Fuse a batch of observations in parallel.
    ///
    /// Outcomes are returned in observation order.
    pub fn fuse_all(&self, observations: &[Observation]) -> Vec<FuseOutcome> {
        observations.par_iter().map(|obs| self.fuse(obs)).collect()
    }

    /// Points within `radius` of `position`, nearest first.
    pub fn query(&self, position: Point2D, radius: f32) -> Vec<MapPoint> {
        if !position.is_finite() || radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let rings = (radius * self.inv_region_size).ceil();
        let cells = (2.0 * rings + 1.0) * (2.0 * rings + 1.0);
        if !rings.is_finite() || cells > self.stripes.len() as f32 * 4.0 {
            // Large radius: a snapshot is cheaper than per-region locking
            return self.snapshot().query(position, radius);
        }

        let keys: Vec<RegionKey> = self.region_of(position).neighbors(rings as i32).collect();
        let locked = self.lock(keys.iter().copied());
        let radius2 = radius * radius;

        let mut found: Vec<(f32, MapPoint)> = keys
            .iter()
            .filter_map(|&k| locked.region(k))
            .flatten()
            .map(|p| (p.position.distance_squared(&position), *p))
            .filter(|(d2, _)| *d2 <= radius2)
            .collect();
        found.sort_by(|(da, pa), (db, pb)| da.total_cmp(db).then(pa.id.cmp(&pb.id)));
        found.into_iter().map(|(_, p)| p).collect()
    }

    /// Immutable copy of every point.
    ///
    /// Locks all stripes in ascending order so no in-flight fusion is seen
    /// half-applied.
    pub fn snapshot(&self) -> Arc<MapSnapshot> {
        let locked = self.lock_all();
        let points: Vec<MapPoint> = locked
            .guards
            .iter()
            .flat_map(|table| table.values().flatten().copied())
            .collect();
        drop(locked);
        Arc::new(MapSnapshot::build(points, self.config.match_radius))
    }

    fn lock_all(&self) -> LockedRegions<'_> {
        let indices: Vec<usize> = (0..self.stripes.len()).collect();
        let guards = self.stripes.iter().map(|s| s.lock()).collect();
        LockedRegions {
            stripe_count: self.stripes.len(),
            indices,
            guards,
        }
    }
}

impl Default for VectorMap {
    fn default() -> Self {
        Self::new(VectorMapConfig::default())
    }
}

impl std::fmt::Debug for VectorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorMap")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}
