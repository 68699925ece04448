//! Square map regions and their lock stripes.

use crate::core::types::Point2D;

/// Integer coordinate of a square map region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl RegionKey {
    /// Create a key from column and row.
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Region containing `position` for regions of side `1 / inv_size`.
    #[inline]
    pub fn containing(position: Point2D, inv_size: f32) -> Self {
        Self::new(
            (position.x * inv_size).floor() as i32,
            (position.y * inv_size).floor() as i32,
        )
    }

    /// This region and its eight neighbours, row-major.
    #[inline]
    pub fn block(&self) -> [RegionKey; 9] {
        let mut keys = [*self; 9];
        let mut k = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                keys[k] = RegionKey::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy));
                k += 1;
            }
        }
        keys
    }

    /// All regions within `radius` rings of this one.
    pub fn neighbors(&self, radius: i32) -> impl Iterator<Item = RegionKey> + '_ {
        (-radius..=radius).flat_map(move |dy| {
            (-radius..=radius)
                .map(move |dx| RegionKey::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy)))
        })
    }

    /// Lock stripe owning this region.
    #[inline]
    pub fn stripe(&self, stripes: usize) -> usize {
        // Spatial hash with large primes
        let hx = (self.x as i64).wrapping_mul(73_856_093);
        let hy = (self.y as i64).wrapping_mul(19_349_663);
        (hx ^ hy).rem_euclid(stripes as i64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containing_negative_coordinates() {
        assert_eq!(RegionKey::containing(Point2D::new(0.05, 0.05), 10.0), RegionKey::new(0, 0));
        assert_eq!(RegionKey::containing(Point2D::new(-0.05, 0.15), 10.0), RegionKey::new(-1, 1));
    }

    #[test]
    fn test_block_contains_self_and_neighbours() {
        let key = RegionKey::new(3, -2);
        let block = key.block();
        assert!(block.contains(&key));
        assert!(block.contains(&RegionKey::new(2, -3)));
        assert!(block.contains(&RegionKey::new(4, -1)));
        assert_eq!(key.neighbors(1).count(), 9);
    }

    #[test]
    fn test_far_regions_do_not_overflow() {
        let far = RegionKey::containing(Point2D::new(1.0e30, -1.0e30), 10.0);
        assert_eq!(far, RegionKey::new(i32::MAX, i32::MIN));
        assert_eq!(far.neighbors(2).count(), 25);
        assert_eq!(far.block().len(), 9);
    }

    #[test]
    fn test_stripe_in_range() {
        for x in -20..20 {
            for y in -20..20 {
                assert!(RegionKey::new(x, y).stripe(7) < 7);
            }
        }
    }
}
