//! Rectangular regions of a cube face covered by one quadtree node.

use glam::DVec2;

/// The square of face-local UV space covered by a chunk.
///
/// `offset` is the lower corner in `[0, 1]²`; `size` is the side length in `(0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    /// Lower corner in face UV space.
    pub offset: DVec2,
    /// Side length in face UV space.
    pub size: f64,
}

impl Footprint {
    /// The footprint of a root chunk: the whole face.
    pub const ROOT: Footprint = Footprint {
        offset: DVec2::ZERO,
        size: 1.0,
    };

    /// Construct a footprint.
    #[must_use]
    pub fn new(offset: DVec2, size: f64) -> Self {
        Self { offset, size }
    }

    /// Split into four equal quadrants.
    ///
    /// Order: `(0, half)`, `(half, half)`, `(0, 0)`, `(half, 0)` relative to `offset`,
    /// i.e. top-left, top-right, bottom-left, bottom-right.
    #[must_use]
    pub fn quadrants(&self) -> [Footprint; 4] {
        let half = self.size * 0.5;
        [
            Footprint::new(self.offset + DVec2::new(0.0, half), half),
            Footprint::new(self.offset + DVec2::new(half, half), half),
            Footprint::new(self.offset, half),
            Footprint::new(self.offset + DVec2::new(half, 0.0), half),
        ]
    }

    /// Center of the footprint in face UV space.
    #[must_use]
    pub fn center_uv(&self) -> DVec2 {
        self.offset + DVec2::splat(self.size * 0.5)
    }

    /// Map a grid percentage in `[0, 1]²` to face UV space.
    #[inline]
    #[must_use]
    pub fn uv_at(&self, percent: DVec2) -> DVec2 {
        self.offset + percent * self.size
    }

    /// Upper corner in face UV space.
    #[must_use]
    pub fn max(&self) -> DVec2 {
        self.offset + DVec2::splat(self.size)
    }

    /// Whether `uv` lies inside the closed rectangle of this footprint.
    ///
    /// Points on a shared edge are contained by both neighbors.
    #[must_use]
    pub fn contains(&self, uv: DVec2) -> bool {
        let max = self.max();
        uv.x >= self.offset.x && uv.x <= max.x && uv.y >= self.offset.y && uv.y <= max.y
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::ROOT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn area(fp: &Footprint) -> f64 {
        fp.size * fp.size
    }

    #[test]
    fn test_root_covers_entire_face() {
        let root = Footprint::ROOT;
        assert_eq!(root.offset, DVec2::ZERO);
        assert!((root.max() - DVec2::ONE).length() < EPSILON);
    }

    #[test]
    fn test_quadrant_offsets_follow_canonical_order() {
        let q = Footprint::ROOT.quadrants();
        assert_eq!(q[0].offset, DVec2::new(0.0, 0.5));
        assert_eq!(q[1].offset, DVec2::new(0.5, 0.5));
        assert_eq!(q[2].offset, DVec2::new(0.0, 0.0));
        assert_eq!(q[3].offset, DVec2::new(0.5, 0.0));
        for child in q {
            assert_eq!(child.size, 0.5);
        }
    }

    #[test]
    fn test_quadrants_tile_parent_exactly() {
        let parent = Footprint::new(DVec2::new(0.25, 0.5), 0.25);
        let children = parent.quadrants();

        let total: f64 = children.iter().map(area).sum();
        assert!((total - area(&parent)).abs() < EPSILON);

        let min = children
            .iter()
            .fold(DVec2::splat(f64::MAX), |acc, c| acc.min(c.offset));
        let max = children
            .iter()
            .fold(DVec2::splat(f64::MIN), |acc, c| acc.max(c.max()));
        assert!((min - parent.offset).length() < EPSILON);
        assert!((max - parent.max()).length() < EPSILON);

        // Disjoint interiors: each child's center lies in no other child.
        for (i, a) in children.iter().enumerate() {
            for (j, b) in children.iter().enumerate() {
                if i != j {
                    assert!(!b.contains(a.center_uv()), "child {i} overlaps child {j}");
                }
            }
        }
    }

    #[test]
    fn test_deep_split_sizes_are_exact_halves() {
        let mut fp = Footprint::ROOT;
        for depth in 1..=20 {
            fp = fp.quadrants()[1];
            assert_eq!(fp.size, 0.5_f64.powi(depth));
        }
    }

    #[test]
    fn test_contains_closed_edges() {
        let fp = Footprint::new(DVec2::new(0.5, 0.0), 0.5);
        assert!(fp.contains(DVec2::new(0.5, 0.0)));
        assert!(fp.contains(DVec2::new(1.0, 0.5)));
        assert!(!fp.contains(DVec2::new(0.49, 0.2)));
    }

    #[test]
    fn test_uv_at_maps_percent_corners() {
        let fp = Footprint::new(DVec2::new(0.25, 0.75), 0.25);
        assert_eq!(fp.uv_at(DVec2::ZERO), fp.offset);
        assert!((fp.uv_at(DVec2::ONE) - fp.max()).length() < EPSILON);
        assert!((fp.uv_at(DVec2::splat(0.5)) - fp.center_uv()).length() < EPSILON);
    }
}
