//! Triangle primitive.
//!
//! Intersection solves the barycentric system with Cramer's rule.

use std::sync::Arc;

use opal_math::{Aabb, Ray, Vec3};

use crate::primitive::{Intersection, Primitive};
use crate::shader::Shader;
use crate::EPSILON;

/// A triangle with one normal per vertex.
///
/// Flat triangles carry the face normal at every vertex; mesh triangles
/// carry the smoothed per-vertex normals and interpolate them at the hit
/// point.
pub struct Triangle {
    vertices: [Vec3; 3],
    normals: [Vec3; 3],
    shader: Arc<dyn Shader>,
    bbox: Aabb,
}

impl Triangle {
    /// Create a flat triangle. The face normal assumes CCW vertex winding.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, shader: Arc<dyn Shader>) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize();
        Self::with_normals([v0, v1, v2], [normal; 3], shader)
    }

    /// Create a triangle with explicit per-vertex normals.
    pub fn with_normals(vertices: [Vec3; 3], normals: [Vec3; 3], shader: Arc<dyn Shader>) -> Self {
        let bbox = Aabb::from_point_set(&vertices);
        Self {
            vertices,
            normals,
            shader,
            bbox,
        }
    }

    /// Interpolate the vertex normals at `point`, weighting each by the
    /// inverse of its distance to the point, and renormalize.
    fn normal_at(&self, point: Vec3) -> Vec3 {
        let mut normal = Vec3::ZERO;
        for (vertex, vertex_normal) in self.vertices.iter().zip(self.normals.iter()) {
            let distance = (point - *vertex).length();
            if distance < EPSILON {
                // Sitting on a vertex; its normal wins outright.
                return *vertex_normal;
            }
            normal += *vertex_normal / distance;
        }
        normal.normalize()
    }
}

impl Primitive for Triangle {
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool {
        let [va, vb, vc] = self.vertices;

        let a = va.x - vb.x;
        let b = va.y - vb.y;
        let c = va.z - vb.z;
        let d = va.x - vc.x;
        let e = va.y - vc.y;
        let f = va.z - vc.z;
        let g = ray.direction.x;
        let h = ray.direction.y;
        let i = ray.direction.z;
        let j = va.x - ray.origin.x;
        let k = va.y - ray.origin.y;
        let l = va.z - ray.origin.z;

        let m = a * (e * i - h * f) + b * (g * f - d * i) + c * (d * h - e * g);
        if m.abs() < 1e-12 {
            // Ray is parallel to the triangle plane.
            return false;
        }

        let t = (f * (a * k - j * b) + e * (j * c - a * l) + d * (b * l - c * k)) / -m;

        let gamma = (i * (a * k - j * b) + h * (j * c - a * l) + g * (b * l - c * k)) / m;
        if !(0.0..=1.0).contains(&gamma) {
            return false;
        }

        let beta = (j * (e * i - h * f) + k * (g * f - d * i) + l * (d * h - e * g)) / m;
        if beta < 0.0 || beta > 1.0 - gamma {
            return false;
        }

        if t < 0.0 {
            return false;
        }

        hit.ray = *ray;
        hit.t = t;
        hit.normal = self.normal_at(ray.at(t));
        hit.shader = self.shader.as_ref();
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn shader(&self) -> &dyn Shader {
        self.shader.as_ref()
    }
}
