use assert2::debug_assert;
use nalgebra::Unit;

use crate::geometry::{BarycentricCoordinates, FloatType, HitRecord, Ray};

use super::TriangleRecord;

impl TriangleRecord {
    /// Watertight ray/triangle test, evaluated in the ray's local frame.
    ///
    /// With `hit` present, its current `t` is an upper bound and the record
    /// is rewritten only for a strictly closer intersection. With `hit`
    /// absent, the test only reports whether any intersection exists inside
    /// the ray's interval (occlusion queries) and writes nothing.
    ///
    /// Degenerate triangles and rays parallel to the triangle plane reject
    /// through a zero determinant; NaN or zero-length directions are not
    /// guarded and propagate through the arithmetic.
    pub fn intersect(&self, ray: &Ray, hit: Option<&mut HitRecord>) -> bool {
        debug_assert!(ray.t_min < ray.t_max);

        let positions = self.positions();
        let (x0, y0, z0) = ray.to_local(&positions[0]);
        let (x1, y1, z1) = ray.to_local(&positions[1]);
        let (x2, y2, z2) = ray.to_local(&positions[2]);

        // Signed edge functions of the sheared 2D projection. Inside means
        // all three agree on sign; zero is inside for either winding.
        let e0 = x1 * z2 - z1 * x2;
        let e1 = x2 * z0 - z2 * x0;
        let e2 = x0 * z1 - z0 * x1;
        if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
            return false;
        }

        let det = e0 + e1 + e2;
        if det == 0.0 {
            return false;
        }

        let t = (e0 * y0 + e1 * y1 + e2 * y2) / det;
        if t <= ray.t_min || t >= ray.t_max {
            return false;
        }

        let Some(hit) = hit else {
            return true;
        };
        if t >= hit.t {
            return false;
        }

        let inv_det = 1.0 / det;
        let uv = BarycentricCoordinates {
            u: e1 * inv_det,
            v: e2 * inv_det,
        };
        self.write_hit(ray, t, &uv, hit);
        true
    }

    /// Resolves the full shading attributes of an accepted intersection.
    /// Both the scalar and the packed path fill hit records through this.
    pub(crate) fn write_hit(
        &self,
        ray: &Ray,
        t: FloatType,
        uv: &BarycentricCoordinates<FloatType>,
        hit: &mut HitRecord,
    ) {
        let vertices = self.vertices();
        let v0 = vertices[0];
        let v1 = vertices[1];
        let v2 = vertices[2];

        hit.t = t;
        // Position by ray evaluation, not by barycentric blend.
        hit.point = ray.point_at(t);
        hit.normal = Unit::new_normalize(uv.interpolate(&v0.normal, &v1.normal, &v2.normal));
        hit.geometric_normal = Unit::new_normalize(
            (v2.position - v0.position).cross(&(v1.position - v0.position)),
        );
        hit.tangent = Unit::new_normalize(uv.interpolate(&v0.tangent, &v1.tangent, &v2.tangent));
        hit.view = -ray.direction;
        hit.texture_coordinates = uv
            .interpolate(
                &v0.texture_coordinates.coords,
                &v1.texture_coordinates.coords,
                &v2.texture_coordinates.coords,
            )
            .into();
        hit.triangle = Some(self.clone());
    }
}
