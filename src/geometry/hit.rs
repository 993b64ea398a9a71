use nalgebra::Unit;

use crate::geometry::{FloatType, TexturePoint, WorldPoint, WorldVector};
use crate::mesh::TriangleRecord;

/// Shading data at the nearest intersection accepted so far.
///
/// The caller creates the record with an upper bound on `t`, passes it into
/// one or more intersection calls, and reads it back afterwards. Every
/// accepted hit strictly lowers `t` and rewrites the remaining fields in
/// place; a rejected test leaves the record untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub t: FloatType,
    pub point: WorldPoint,
    /// Shading normal, interpolated from the vertices.
    pub normal: Unit<WorldVector>,
    /// Face normal: `cross(p2 - p0, p1 - p0)`, normalized.
    pub geometric_normal: Unit<WorldVector>,
    pub tangent: Unit<WorldVector>,
    /// Negated ray direction, not renormalized.
    pub view: WorldVector,
    pub texture_coordinates: TexturePoint,
    /// The face that produced the hit.
    pub triangle: Option<TriangleRecord>,
}

impl HitRecord {
    pub fn new() -> HitRecord {
        Self::with_max_t(FloatType::INFINITY)
    }

    /// Record primed so that only hits strictly closer than `t` are accepted.
    pub fn with_max_t(t: FloatType) -> HitRecord {
        HitRecord {
            t,
            point: WorldPoint::origin(),
            normal: Unit::new_unchecked(WorldVector::z()),
            geometric_normal: Unit::new_unchecked(WorldVector::z()),
            tangent: Unit::new_unchecked(WorldVector::x()),
            view: WorldVector::zeros(),
            texture_coordinates: TexturePoint::origin(),
            triangle: None,
        }
    }
}

impl Default for HitRecord {
    fn default() -> Self {
        Self::new()
    }
}
