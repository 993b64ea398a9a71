use assert2::debug_assert;
use num_traits::zero;
use simba::simd::{SimdPartialOrd as _, SimdValue as _};

use crate::geometry::{BarycentricCoordinates, FloatType, HitRecord, Ray, SimdFloatType};

use super::{PACK_LANES, TrianglePack4};

impl TrianglePack4 {
    /// Tests the ray against all four lanes at once and resolves the nearest
    /// surviving lane into `hit`.
    ///
    /// Semantically this is the scalar test run per occupied lane against the
    /// same incoming bound, keeping the single closest accepted hit; equal
    /// distances resolve to the lowest lane index. As in the scalar test,
    /// `hit: None` only reports existence.
    ///
    /// The pack must have been packed since the last push; debug builds
    /// assert that the mask matches the occupancy.
    pub fn intersect4(&self, ray: &Ray, hit: Option<&mut HitRecord>) -> bool {
        debug_assert!(ray.t_min < ray.t_max);
        debug_assert!(self.mask.0.move_mask().count_ones() as usize == self.triangles.len());

        let mut mask = self.mask;
        if mask.0.move_mask() == 0 {
            return false;
        }

        // The scalar algorithm, lane-wise: translate into ray-relative space,
        // permute the dominant direction axis into local y, shear.
        let origin = ray.origin.map(|x| SimdFloatType::splat(x));
        let p0 = self.positions[0] - origin;
        let p1 = self.positions[1] - origin;
        let p2 = self.positions[2] - origin;

        let sx = SimdFloatType::splat(ray.scale_x);
        let sy = SimdFloatType::splat(ray.scale_y);
        let sz = SimdFloatType::splat(ray.scale_z);

        let x0 = p0[ray.local_x] + sx * p0[ray.local_y];
        let y0 = p0[ray.local_y] * sy;
        let z0 = p0[ray.local_z] + sz * p0[ray.local_y];
        let x1 = p1[ray.local_x] + sx * p1[ray.local_y];
        let y1 = p1[ray.local_y] * sy;
        let z1 = p1[ray.local_z] + sz * p1[ray.local_y];
        let x2 = p2[ray.local_x] + sx * p2[ray.local_y];
        let y2 = p2[ray.local_y] * sy;
        let z2 = p2[ray.local_z] + sz * p2[ray.local_y];

        let e0 = x1 * z2 - z1 * x2;
        let e1 = x2 * z0 - z2 * x0;
        let e2 = x0 * z1 - z0 * x1;

        // Each rejection stage narrows the mask; a dead mask ends the test
        // early without touching the remaining stages.
        let inside = (e0.simd_ge(zero()) & e1.simd_ge(zero()) & e2.simd_ge(zero()))
            | (e0.simd_le(zero()) & e1.simd_le(zero()) & e2.simd_le(zero()));
        mask = mask & inside;
        if mask.0.move_mask() == 0 {
            return false;
        }

        let det = e0 + e1 + e2;
        mask = mask & det.simd_ne(zero());
        if mask.0.move_mask() == 0 {
            return false;
        }

        let t = (e0 * y0 + e1 * y1 + e2 * y2) / det;
        mask = mask
            & t.simd_gt(SimdFloatType::splat(ray.t_min))
            & t.simd_lt(SimdFloatType::splat(ray.t_max));
        if mask.0.move_mask() == 0 {
            return false;
        }

        let Some(hit) = hit else {
            return true;
        };

        mask = mask & t.simd_lt(SimdFloatType::splat(hit.t));
        let live = mask.0.move_mask();
        if live == 0 {
            return false;
        }

        // Nearest surviving lane; strict < keeps the lowest lane on equal t.
        let mut best: Option<(usize, FloatType)> = None;
        for lane in 0..PACK_LANES {
            if live & (1 << lane) == 0 {
                continue;
            }
            let lane_t = t.extract(lane);
            if best.map_or(true, |(_, best_t)| lane_t < best_t) {
                best = Some((lane, lane_t));
            }
        }
        let Some((lane, lane_t)) = best else {
            return false;
        };

        // Full attributes are resolved for the winning lane only.
        let inv_det = 1.0 / det.extract(lane);
        let uv = BarycentricCoordinates {
            u: e1.extract(lane) * inv_det,
            v: e2.extract(lane) * inv_det,
        };
        self.triangles[lane].write_hit(ray, lane_t, &uv, hit);
        true
    }
}
