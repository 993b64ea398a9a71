use arrayvec::ArrayVec;
use assert2::assert;
use simba::simd::{SimdValue as _, WideF32x4};
// This module uses wide directly where lanes are assembled from scalars
use wide::f32x4;

use crate::geometry::{FloatType, SimdMaskType, Triangle, WorldPoint4};

use super::TriangleRecord;

/// Lane count of [`TrianglePack4`].
pub const PACK_LANES: usize = 4;

/// Fixed-capacity structure-of-arrays group of triangles for the packed
/// intersection path: three vertices times three coordinates, four lanes
/// each, plus a validity mask and the records the lanes came from.
///
/// Only the mask decides which lanes are live, so stale coordinate data in
/// free lanes can never leak into a result. Build with [`push`](Self::push)
/// followed by [`pack`](Self::pack); [`reset`](Self::reset) empties the pack
/// for reuse without reallocation.
#[derive(Clone, Debug)]
pub struct TrianglePack4 {
    pub(crate) positions: Triangle<WorldPoint4>,
    pub(crate) mask: SimdMaskType,
    pub(crate) triangles: ArrayVec<TriangleRecord, PACK_LANES>,
}

impl TrianglePack4 {
    pub fn new() -> TrianglePack4 {
        Default::default()
    }

    /// Appends a triangle into the first free lane and reports whether the
    /// pack is now full. Pushing into a full pack is a caller error and
    /// panics.
    pub fn push(&mut self, triangle: TriangleRecord) -> bool {
        assert!(!self.triangles.is_full());
        self.triangles.push(triangle);
        self.triangles.is_full()
    }

    /// Gathers the vertex positions of the occupied lanes into the
    /// coordinate lane groups and rebuilds the validity mask. Free lanes are
    /// zeroed.
    pub fn pack(&mut self) {
        // [vertex][axis][lane]
        let mut lanes = [[[0.0; PACK_LANES]; 3]; 3];
        for (lane, triangle) in self.triangles.iter().enumerate() {
            let positions = triangle.positions();
            for vertex in 0..3 {
                for axis in 0..3 {
                    lanes[vertex][axis][lane] = positions[vertex][axis];
                }
            }
        }
        self.positions = Triangle::new(point4(&lanes[0]), point4(&lanes[1]), point4(&lanes[2]));

        let mut mask = SimdMaskType::splat(false);
        for lane in 0..self.triangles.len() {
            mask.replace(lane, true);
        }
        self.mask = mask;
    }

    /// Empties the pack for reuse. The coordinate lanes keep their last
    /// packed values; the cleared mask keeps them from ever matching.
    pub fn reset(&mut self) {
        self.triangles.clear();
        self.mask = SimdMaskType::splat(false);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.triangles.is_full()
    }
}

impl Default for TrianglePack4 {
    fn default() -> Self {
        TrianglePack4 {
            positions: Triangle::new(
                WorldPoint4::origin(),
                WorldPoint4::origin(),
                WorldPoint4::origin(),
            ),
            mask: SimdMaskType::splat(false),
            triangles: ArrayVec::new(),
        }
    }
}

fn point4(axes: &[[FloatType; PACK_LANES]; 3]) -> WorldPoint4 {
    WorldPoint4::new(
        WideF32x4(f32x4::new(axes[0])),
        WideF32x4(f32x4::new(axes[1])),
        WideF32x4(f32x4::new(axes[2])),
    )
}

#[cfg(test)]
mod tests {
    use super::super::test_mesh;
    use super::*;
    use assert2::assert;

    fn square_mesh() -> crate::mesh::TriangleMesh {
        test_mesh(&[
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
        ])
    }

    #[test]
    fn push_reports_full_on_fourth() {
        let mesh = square_mesh();
        let mut pack = TrianglePack4::new();
        assert!(!pack.push(mesh.triangle(0)));
        assert!(!pack.push(mesh.triangle(1)));
        assert!(!pack.push(mesh.triangle(0)));
        assert!(pack.push(mesh.triangle(1)));
        assert!(pack.is_full());
        assert!(pack.len() == 4);
    }

    #[test]
    #[should_panic]
    fn fifth_push_panics() {
        let mesh = square_mesh();
        let mut pack = TrianglePack4::new();
        for _ in 0..4 {
            pack.push(mesh.triangle(0));
        }
        pack.push(mesh.triangle(1));
    }

    #[test]
    fn pack_masks_only_occupied_lanes() {
        let mesh = square_mesh();
        let mut pack = TrianglePack4::new();
        pack.push(mesh.triangle(0));
        pack.push(mesh.triangle(1));
        pack.pack();

        assert!(pack.mask.0.move_mask() == 0b0011);

        let x0 = pack.positions[0].x.0.to_array();
        assert!(x0[0] == 0.0);
        assert!(x0[1] == 1.0);
        // Free lanes hold the zero placeholder.
        assert!(x0[2] == 0.0 && x0[3] == 0.0);
    }

    #[test]
    fn reset_empties_without_reallocation() {
        let mesh = square_mesh();
        let mut pack = TrianglePack4::new();
        pack.push(mesh.triangle(0));
        pack.pack();
        pack.reset();

        assert!(pack.is_empty());
        assert!(pack.mask.0.move_mask() == 0);

        // Reusable for a fresh group afterwards.
        pack.push(mesh.triangle(1));
        pack.pack();
        assert!(pack.mask.0.move_mask() == 0b0001);
    }
}
