mod ray_pack_intersection;
mod ray_triangle_intersection;
mod triangle_pack;

pub use triangle_pack::{PACK_LANES, TrianglePack4};

use std::sync::Arc;

use index_vec::IndexVec;
use itertools::Itertools as _;
use thiserror::Error;

use crate::geometry::{HitRecord, Ray, TexturePoint, Triangle, WorldPoint, WorldVector};

index_vec::define_index_type! {
    pub struct VertexIdx = u32;
    IMPL_RAW_CONVERSIONS = true;
}

/// Per-vertex attributes of a mesh.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub position: WorldPoint,
    pub normal: WorldVector,
    pub tangent: WorldVector,
    pub texture_coordinates: TexturePoint,
}

/// Shared, immutable vertex storage of one mesh.
///
/// Owned by the mesh and kept alive through `Arc` by every triangle record
/// derived from it, so a record can never outlive its vertex data.
#[derive(Debug)]
pub struct VertexBuffer {
    vertices: IndexVec<VertexIdx, Vertex>,
}

impl VertexBuffer {
    pub fn vertex(&self, index: VertexIdx) -> &Vertex {
        &self.vertices[index]
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("index buffer holds {index_count} indices, not a multiple of 3")]
    TruncatedFace { index_count: usize },

    #[error("face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        vertex: u32,
        vertex_count: usize,
    },
}

/// Triangulated mesh: a vertex buffer plus faces indexing into it.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    buffer: Arc<VertexBuffer>,
    faces: Vec<Triangle<VertexIdx>>,
}

impl TriangleMesh {
    /// Builds a mesh from vertices and a flat index buffer, three indices per
    /// face. Every index is validated against the vertex buffer up front so
    /// that triangle records never need bounds checks of their own.
    pub fn new(vertices: Vec<Vertex>, indices: &[u32]) -> Result<TriangleMesh, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::TruncatedFace {
                index_count: indices.len(),
            });
        }

        let vertex_count = vertices.len();
        let faces = indices
            .iter()
            .tuples()
            .enumerate()
            .map(|(face, (a, b, c))| {
                for &vertex in [a, b, c] {
                    if vertex as usize >= vertex_count {
                        return Err(MeshError::IndexOutOfRange {
                            face,
                            vertex,
                            vertex_count,
                        });
                    }
                }
                Ok(Triangle::new(
                    VertexIdx::from_raw(*a),
                    VertexIdx::from_raw(*b),
                    VertexIdx::from_raw(*c),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TriangleMesh {
            buffer: Arc::new(VertexBuffer {
                vertices: vertices.into_iter().collect(),
            }),
            faces,
        })
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn triangle(&self, face: usize) -> TriangleRecord {
        TriangleRecord {
            buffer: Arc::clone(&self.buffer),
            indices: self.faces[face],
        }
    }

    /// Records for every face of the mesh, in face order.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleRecord> + '_ {
        self.faces.iter().map(|indices| TriangleRecord {
            buffer: Arc::clone(&self.buffer),
            indices: *indices,
        })
    }

    /// Nearest-hit sweep over every face, one scalar test at a time.
    pub fn intersect(&self, ray: &Ray, hit: &mut HitRecord) -> bool {
        let mut any = false;
        for triangle in self.triangles() {
            any |= triangle.intersect(ray, Some(hit));
        }
        any
    }

    /// Nearest-hit sweep over every face, four lanes at a time.
    /// A single pack is reused across the whole sweep.
    pub fn intersect_packed(&self, ray: &Ray, hit: &mut HitRecord) -> bool {
        let mut pack = TrianglePack4::new();
        let mut any = false;
        for triangle in self.triangles() {
            if pack.push(triangle) {
                pack.pack();
                any |= pack.intersect4(ray, Some(hit));
                pack.reset();
            }
        }
        if !pack.is_empty() {
            pack.pack();
            any |= pack.intersect4(ray, Some(hit));
        }
        any
    }

    /// Whether anything blocks the ray inside its interval.
    pub fn occluded(&self, ray: &Ray) -> bool {
        self.triangles().any(|triangle| triangle.intersect(ray, None))
    }
}

/// One face of a mesh: three vertex indices plus the shared vertex buffer
/// they point into.
#[derive(Clone, Debug)]
pub struct TriangleRecord {
    buffer: Arc<VertexBuffer>,
    indices: Triangle<VertexIdx>,
}

impl TriangleRecord {
    pub fn indices(&self) -> Triangle<VertexIdx> {
        self.indices
    }

    pub fn buffer(&self) -> &VertexBuffer {
        &self.buffer
    }

    pub fn positions(&self) -> Triangle<WorldPoint> {
        self.indices.map(|i| self.buffer.vertices[*i].position)
    }

    pub(crate) fn vertices(&self) -> Triangle<&Vertex> {
        self.indices.map(|i| &self.buffer.vertices[*i])
    }
}

/// Records are equal when they name the same face of the same buffer.
impl PartialEq for TriangleRecord {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer) && self.indices == other.indices
    }
}

/// Mesh whose faces all lie in a plane perpendicular to z, one vertex triple
/// per face, with placeholder shading attributes.
#[cfg(test)]
pub(crate) fn test_mesh(positions: &[[f32; 3]]) -> TriangleMesh {
    let vertices = positions
        .iter()
        .map(|&[x, y, z]| Vertex {
            position: WorldPoint::new(x, y, z),
            normal: WorldVector::z(),
            tangent: WorldVector::x(),
            texture_coordinates: TexturePoint::origin(),
        })
        .collect();
    let indices: Vec<u32> = (0..positions.len() as u32).collect();
    TriangleMesh::new(vertices, &indices).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert2::assert;
    use test_case::test_case;

    fn unit_vertices(count: usize) -> Vec<Vertex> {
        (0..count)
            .map(|i| Vertex {
                position: WorldPoint::new(i as f32, 0.0, 0.0),
                normal: WorldVector::z(),
                tangent: WorldVector::x(),
                texture_coordinates: TexturePoint::origin(),
            })
            .collect()
    }

    #[test_case(&[0, 1] ; "two indices")]
    #[test_case(&[0, 1, 2, 0] ; "dangling index")]
    fn rejects_bad_index_count(indices: &[u32]) {
        assert!(matches!(
            TriangleMesh::new(unit_vertices(3), indices),
            Err(MeshError::TruncatedFace { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert!(matches!(
            TriangleMesh::new(unit_vertices(3), &[0, 1, 3]),
            Err(MeshError::IndexOutOfRange {
                face: 0,
                vertex: 3,
                vertex_count: 3,
            })
        ));
    }

    #[test]
    fn records_compare_by_face_identity() {
        let mesh = test_mesh(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
        ]);
        assert!(mesh.face_count() == 2);
        assert!(mesh.triangle(0) == mesh.triangle(0));
        assert!(mesh.triangle(0) != mesh.triangle(1));

        // Same indices in a different mesh are a different face.
        let other = test_mesh(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(mesh.triangle(0) != other.triangle(0));
    }

    #[test]
    fn records_keep_the_buffer_alive() {
        let record = {
            let mesh = test_mesh(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
            mesh.triangle(0)
        };
        assert!(record.positions()[1] == WorldPoint::new(1.0, 0.0, 0.0));
    }
}
