use assert2::debug_assert;
use bon::bon;

use crate::geometry::{FloatType, WorldPoint, WorldVector};

/// Ray with its valid parametric interval and the cached local frame used by
/// the triangle intersectors.
///
/// The frame (axis permutation putting the dominant direction axis into the
/// local y slot, plus the shear coefficients that align the direction with
/// local (0, 1, 0)) is computed once here and reused by every triangle test
/// against this ray.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    pub origin: WorldPoint,
    /// Direction of the ray. Not required to be normalized; `t` values are
    /// relative to its magnitude.
    pub direction: WorldVector,
    pub t_min: FloatType,
    pub t_max: FloatType,

    pub(crate) local_x: usize,
    pub(crate) local_y: usize,
    pub(crate) local_z: usize,
    pub(crate) scale_x: FloatType,
    pub(crate) scale_y: FloatType,
    pub(crate) scale_z: FloatType,
}

#[bon]
impl Ray {
    /// A ray with `t_min`/`t_max` defaulting to `0` and positive infinity.
    /// An interval with `t_min >= t_max` is a caller error, checked in debug
    /// builds only.
    #[builder]
    pub fn new(
        origin: WorldPoint,
        direction: WorldVector,
        t_min: Option<FloatType>,
        t_max: Option<FloatType>,
    ) -> Ray {
        let t_min = t_min.unwrap_or(0.0);
        let t_max = t_max.unwrap_or(FloatType::INFINITY);
        debug_assert!(t_min < t_max);

        let local_y = direction.iamax();
        let local_x = (local_y + 1) % 3;
        let local_z = (local_x + 1) % 3;

        let scale_x = -direction[local_x] / direction[local_y];
        let scale_y = 1.0 / direction[local_y];
        let scale_z = -direction[local_z] / direction[local_y];

        Ray {
            origin,
            direction,
            t_min,
            t_max,
            local_x,
            local_y,
            local_z,
            scale_x,
            scale_y,
            scale_z,
        }
    }
}

impl Ray {
    pub fn point_at(&self, t: FloatType) -> WorldPoint {
        self.origin + self.direction * t
    }

    /// Maps a world point into the ray frame: translated to the origin,
    /// permuted so the dominant direction axis is y, sheared so the direction
    /// becomes (0, 1, 0).
    pub(crate) fn to_local(&self, point: &WorldPoint) -> (FloatType, FloatType, FloatType) {
        let p = point - self.origin;
        let x = p[self.local_x];
        let y = p[self.local_y];
        let z = p[self.local_z];
        (x + self.scale_x * y, y * self.scale_y, z + self.scale_z * y)
    }
}
