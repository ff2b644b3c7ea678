//! Indexed triangle mesh primitive.

use std::sync::Arc;

use opal_math::{Aabb, Ray, Vec3};

use crate::error::SceneError;
use crate::primitive::{Intersection, Primitive};
use crate::shader::Shader;
use crate::triangle::Triangle;

/// A triangle mesh built from vertex and index buffers.
///
/// The external scene loader hands over plain buffers; the mesh expands
/// them into its triangle list once and precomputes its bounding box.
pub struct Mesh {
    triangles: Vec<Triangle>,
    shader: Arc<dyn Shader>,
    bbox: Aabb,
}

impl Mesh {
    /// Create a flat-shaded mesh. Every index must address a vertex.
    pub fn new(
        positions: Vec<Vec3>,
        indices: Vec<[usize; 3]>,
        shader: Arc<dyn Shader>,
    ) -> Result<Self, SceneError> {
        Self::build(positions, None, indices, shader)
    }

    /// Create a smooth-shaded mesh with one normal per vertex.
    pub fn with_normals(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<[usize; 3]>,
        shader: Arc<dyn Shader>,
    ) -> Result<Self, SceneError> {
        Self::build(positions, Some(normals), indices, shader)
    }

    fn build(
        positions: Vec<Vec3>,
        normals: Option<Vec<Vec3>>,
        indices: Vec<[usize; 3]>,
        shader: Arc<dyn Shader>,
    ) -> Result<Self, SceneError> {
        if let Some(normals) = &normals {
            if normals.len() != positions.len() {
                return Err(SceneError::MeshNormals {
                    normals: normals.len(),
                    vertices: positions.len(),
                });
            }
        }

        let count = positions.len();
        let fetch = |index: usize| -> Result<Vec3, SceneError> {
            positions
                .get(index)
                .copied()
                .ok_or(SceneError::MeshIndex { index, count })
        };

        let mut triangles = Vec::with_capacity(indices.len());
        for [i0, i1, i2] in indices {
            let v0 = fetch(i0)?;
            let v1 = fetch(i1)?;
            let v2 = fetch(i2)?;
            let triangle = match &normals {
                Some(normals) => Triangle::with_normals(
                    [v0, v1, v2],
                    [normals[i0], normals[i1], normals[i2]],
                    Arc::clone(&shader),
                ),
                None => Triangle::new(v0, v1, v2, Arc::clone(&shader)),
            };
            triangles.push(triangle);
        }

        let bbox = Aabb::from_point_set(&positions);
        Ok(Self {
            triangles,
            shader,
            bbox,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

impl Primitive for Mesh {
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool {
        if !self.bbox.hit(ray) {
            return false;
        }

        let mut best = Intersection {
            t: f64::MAX,
            ..Intersection::default()
        };
        let mut candidate = Intersection::default();
        for triangle in &self.triangles {
            if triangle.intersect(ray, &mut candidate) && candidate.t < best.t {
                best = candidate;
            }
        }

        if best.t < f64::MAX {
            *hit = best;
            hit.shader = self.shader.as_ref();
            true
        } else {
            false
        }
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn shader(&self) -> &dyn Shader {
        self.shader.as_ref()
    }
}
