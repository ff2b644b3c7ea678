//! Axis-aligned box primitive.

use std::sync::Arc;

use opal_math::{Aabb, Ray, Vec3};

use crate::primitive::{Intersection, Primitive};
use crate::shader::Shader;
use crate::triangle::Triangle;

const TRIANGLES_IN_A_BOX: usize = 12;

/// An axis-aligned box, realized as twelve triangles (two per face).
///
/// The box's own AABB doubles as an early-out test before the triangles
/// are scanned.
pub struct AaBox {
    triangles: Vec<Triangle>,
    shader: Arc<dyn Shader>,
    bbox: Aabb,
}

impl AaBox {
    pub fn new(min_point: Vec3, max_point: Vec3, shader: Arc<dyn Shader>) -> Self {
        let bbox = Aabb::from_points(min_point, max_point);
        let triangles = Self::tessellate(min_point, max_point, &shader);
        Self {
            triangles,
            shader,
            bbox,
        }
    }

    fn tessellate(min_point: Vec3, max_point: Vec3, shader: &Arc<dyn Shader>) -> Vec<Triangle> {
        let extent = max_point - min_point;
        let dx = extent.x;
        let dy = extent.y;
        let dz = extent.z;

        // Vertices of the box, offset from the minimum corner.
        let a = min_point + Vec3::new(0.0, 0.0, 0.0); // bottom back left
        let b = min_point + Vec3::new(0.0, dy, dz); // top front left
        let c = min_point + Vec3::new(0.0, dy, 0.0); // top back left
        let d = min_point + Vec3::new(dx, dy, 0.0); // top back right
        let e = min_point + Vec3::new(dx, 0.0, 0.0); // bottom back right
        let f = min_point + Vec3::new(0.0, 0.0, dz); // bottom front left
        let g = min_point + Vec3::new(dx, 0.0, dz); // bottom front right
        let h = min_point + Vec3::new(dx, dy, dz); // top front right

        // Two triangles per face, CCW winding as seen from outside.
        let faces = [
            (a, b, c),
            (a, c, d),
            (a, d, e),
            (a, e, f),
            (f, e, g),
            (e, d, h),
            (e, h, g),
            (b, d, c),
            (d, b, h),
            (a, f, b),
            (f, h, b),
            (f, g, h),
        ];

        faces
            .iter()
            .map(|&(v0, v1, v2)| Triangle::new(v0, v1, v2, Arc::clone(shader)))
            .collect()
    }
}

impl Primitive for AaBox {
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool {
        if !self.bbox.hit(ray) {
            return false;
        }

        debug_assert_eq!(self.triangles.len(), TRIANGLES_IN_A_BOX);

        // Exhaustive scan over the twelve triangles, keeping the nearest.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{Color, Solid};

    fn gray() -> Arc<dyn Shader> {
        Arc::new(Solid::new(Color::splat(0.5)))
    }

    fn unit_box() -> AaBox {
        AaBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0), gray())
    }

    #[test]
    fn test_box_hit_reports_nearest_face() {
        let aabox = unit_box();
        let ray = Ray::new(Vec3::new(0.2, 0.3, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();

        assert!(aabox.intersect(&ray, &mut hit));
        assert!((hit.t - 4.0).abs() < 1e-12, "front face is at z=1");
        assert!((hit.normal - Vec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_box_miss() {
        let aabox = unit_box();
        let ray = Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();
        assert!(!aabox.intersect(&ray, &mut hit));
    }

    #[test]
    fn test_box_hit_each_axis() {
        let aabox = unit_box();
        let probes = [
            (Vec3::new(5.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), Vec3::X),
            (Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), -Vec3::X),
            (Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), Vec3::Y),
            (Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0), -Vec3::Z),
        ];
        for (origin, direction, expected_normal) in probes {
            let ray = Ray::new(origin, direction);
            let mut hit = Intersection::default();
            assert!(aabox.intersect(&ray, &mut hit), "probe from {origin:?}");
            assert!((hit.t - 4.0).abs() < 1e-9);
            assert!(
                (hit.normal - expected_normal).length() < 1e-9,
                "face normal for probe from {origin:?}"
            );
        }
    }

    #[test]
    fn test_box_shader_is_the_boxes() {
        let aabox = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();
        assert!(aabox.intersect(&ray, &mut hit));
        assert!(std::ptr::eq(
            hit.shader as *const dyn Shader as *const (),
            aabox.shader() as *const dyn Shader as *const ()
        ));
    }
}
