//! Sphere primitive.

use std::sync::Arc;

use opal_math::{Aabb, Ray, Vec3};

use crate::primitive::{Intersection, Primitive};
use crate::shader::Shader;

/// A sphere given by center and radius.
pub struct Sphere {
    center: Vec3,
    radius: f64,
    shader: Arc<dyn Shader>,
    bbox: Aabb,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64, shader: Arc<dyn Shader>) -> Self {
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);
        Self {
            center,
            radius,
            shader,
            bbox,
        }
    }
}

impl Primitive for Sphere {
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool {
        // Quadratic in t from |O + tD - C| = r.
        let offset = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * ray.direction.dot(offset);
        let c = offset.dot(offset) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrt_d = discriminant.sqrt();
        let t_near = (-b - sqrt_d) / (2.0 * a);
        let t_far = (-b + sqrt_d) / (2.0 * a);

        // Smallest non-negative root; both behind the origin is a miss.
        let t = if t_near >= 0.0 {
            t_near
        } else if t_far >= 0.0 {
            t_far
        } else {
            return false;
        };

        hit.ray = *ray;
        hit.t = t;
        hit.normal = (ray.at(t) - self.center).normalize();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{Color, Solid};

    fn gray() -> Arc<dyn Shader> {
        Arc::new(Solid::new(Color::splat(0.5)))
    }

    #[test]
    fn test_sphere_hit_from_outside() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, gray());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();

        assert!(sphere.intersect(&ray, &mut hit));
        assert!((hit.t - 4.0).abs() < 1e-12, "entry point is the near root");
        assert!((hit.normal - Vec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, gray());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let mut hit = Intersection::default();
        assert!(!sphere.intersect(&ray, &mut hit));
    }

    #[test]
    fn test_sphere_behind_origin_is_a_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0, gray());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();
        assert!(
            !sphere.intersect(&ray, &mut hit),
            "both roots negative must not report a hit"
        );
    }

    #[test]
    fn test_sphere_hit_from_inside_picks_positive_root() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0, gray());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let mut hit = Intersection::default();

        assert!(sphere.intersect(&ray, &mut hit));
        assert!((hit.t - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_unnormalized_direction() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, gray());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0));
        let mut hit = Intersection::default();

        assert!(sphere.intersect(&ray, &mut hit));
        // t is parametric in the given direction, not in world units.
        assert!((hit.t - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_bounding_box() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 2.0, gray());
        let bbox = sphere.bounding_box();
        assert_eq!(bbox.min_point(), Vec3::new(-1.0, 0.0, 1.0));
        assert_eq!(bbox.max_point(), Vec3::new(3.0, 4.0, 5.0));
    }
}
