//! Finite cylinder primitive, axis-aligned to y.

use std::sync::Arc;

use opal_math::{Aabb, Ray, Vec3};

use crate::primitive::{Intersection, Primitive};
use crate::shader::Shader;
use crate::EPSILON;

/// An open cylinder centered on `center`, running `height` along the y
/// axis.
pub struct Cylinder {
    center: Vec3,
    height: f64,
    radius: f64,
    shader: Arc<dyn Shader>,
    bbox: Aabb,
}

impl Cylinder {
    pub fn new(center: Vec3, height: f64, radius: f64, shader: Arc<dyn Shader>) -> Self {
        let half = Vec3::new(radius, height / 2.0, radius);
        let bbox = Aabb::from_points(center - half, center + half);
        Self {
            center,
            height,
            radius,
            shader,
            bbox,
        }
    }
}

impl Primitive for Cylinder {
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool {
        let min_y = self.center.y - self.height / 2.0;
        let max_y = self.center.y + self.height / 2.0;

        // Quadratic in the two non-axis coordinates.
        let ox = ray.origin.x - self.center.x;
        let oz = ray.origin.z - self.center.z;
        let dx = ray.direction.x;
        let dz = ray.direction.z;

        let a = dx * dx + dz * dz;
        if a < 1e-12 {
            // Running parallel to the axis; never crosses the lateral
            // surface.
            return false;
        }
        let b = 2.0 * (ox * dx + oz * dz);
        let c = ox * ox + oz * oz - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrt_d = discriminant.sqrt();
        let mut t1 = (-b + sqrt_d) / (2.0 * a);
        let mut t2 = (-b - sqrt_d) / (2.0 * a);

        // A root is disqualified when it lies behind the origin or outside
        // the finite y extent; disqualified roots are pushed to infinity so
        // the min-comparison below cannot pick them.
        let mut t1_out = t1 < 0.0;
        let mut t2_out = t2 < 0.0;

        let p1 = ray.at(t1);
        if p1.y < min_y || p1.y > max_y {
            t1_out = true;
        }
        let p2 = ray.at(t2);
        if p2.y < min_y || p2.y > max_y {
            t2_out = true;
        }

        if t1_out && t2_out {
            return false;
        }
        if t1_out {
            t1 = f64::MAX;
        }
        if t2_out {
            t2 = f64::MAX;
        }

        let (t, point) = if t1 < t2 { (t1, p1) } else { (t2, p2) };

        hit.ray = *ray;
        hit.t = t;

        // Radial normal: zero the axis component.
        let mut normal = point - self.center;
        normal.y = 0.0;
        normal = normal.normalize();

        // Flip the normal when the ray strikes the inside wall.
        if normal.dot(ray.direction.normalize()) > 0.0 {
            normal = -normal;
        }
        hit.normal = normal;

        // Pull the hit back a little so secondary rays start outside the
        // surface.
        hit.t -= EPSILON;

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
