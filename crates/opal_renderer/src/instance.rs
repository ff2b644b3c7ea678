//! Transformed instances of other primitives.
//!
//! An instance shares the wrapped primitive, so many placements of the
//! same geometry cost one copy of the geometry plus a matrix each.

use std::sync::Arc;

use opal_math::{Aabb, Matrix4, Ray};

use crate::error::SceneError;
use crate::primitive::{Intersection, Primitive};
use crate::shader::Shader;

/// A primitive placed in the world by a transform.
pub struct Instance {
    object: Arc<dyn Primitive>,
    /// World-to-local transform, for mapping incoming rays.
    inverse: Matrix4,
    /// Transpose of `inverse`, for mapping normals back to world space.
    inverse_transpose: Matrix4,
    /// World-space bounding box: the wrapped box through the forward
    /// transform.
    bbox: Aabb,
    shader: Option<Arc<dyn Shader>>,
}

impl Instance {
    /// Wrap `object` with `transform`. A shader override replaces the
    /// wrapped primitive's shader for this placement only.
    ///
    /// Fails when the transform cannot be inverted.
    pub fn new(
        transform: Matrix4,
        object: Arc<dyn Primitive>,
        shader: Option<Arc<dyn Shader>>,
    ) -> Result<Self, SceneError> {
        let inverse = transform.inverse().ok_or(SceneError::SingularTransform)?;
        let bbox = transform.transform_aabb(&object.bounding_box());
        Ok(Self {
            object,
            inverse_transpose: inverse.transpose(),
            inverse,
            bbox,
            shader,
        })
    }
}

impl Primitive for Instance {
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool {
        // Intersect in the primitive's local space. The direction is not
        // renormalized, so the local t is also the world t.
        let local_ray = self.inverse.transform_ray(ray);
        if !self.object.intersect(&local_ray, hit) {
            return false;
        }

        hit.ray = *ray;
        hit.normal = self
            .inverse_transpose
            .transform_vector(hit.normal)
            .normalize();
        if let Some(shader) = &self.shader {
            hit.shader = shader.as_ref();
        }
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn shader(&self) -> &dyn Shader {
        match &self.shader {
            Some(shader) => shader.as_ref(),
            None => self.object.shader(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{Color, Solid};
    use crate::sphere::Sphere;
    use opal_math::Vec3;

    fn gray() -> Arc<dyn Shader> {
        Arc::new(Solid::new(Color::splat(0.5)))
    }

    fn unit_sphere() -> Arc<dyn Primitive> {
        Arc::new(Sphere::new(Vec3::ZERO, 1.0, gray()))
    }

    #[test]
    fn test_translated_instance() {
        let instance = Instance::new(
            Matrix4::translation(0.0, 0.0, -5.0),
            unit_sphere(),
            None,
        )
        .expect("invertible");

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();
        assert!(instance.intersect(&ray, &mut hit));
        assert!((hit.t - 4.0).abs() < 1e-9);
        // The record carries the world-space ray back out.
        assert_eq!(hit.ray, ray);
        assert!((hit.normal - Vec3::Z).length() < 1e-9);
    }

    #[test]
    fn test_scaled_instance_normal_uses_inverse_transpose() {
        // Squash the sphere along y into an ellipsoid.
        let instance = Instance::new(
            Matrix4::scale(1.0, 0.5, 1.0),
            unit_sphere(),
            None,
        )
        .expect("invertible");

        // Strike the ellipsoid at a 45-degree point; a naive rotated
        // normal would be wrong here, the inverse transpose steepens it.
        let hit_point = Vec3::new((0.5f64).sqrt(), 0.5 * (0.5f64).sqrt(), 0.0);
        let ray = Ray::new(
            hit_point + Vec3::new(1.0, 2.0, 0.0).normalize() * 5.0,
            -Vec3::new(1.0, 2.0, 0.0).normalize(),
        );
        let mut hit = Intersection::default();
        assert!(instance.intersect(&ray, &mut hit));
        assert!((hit.normal.length() - 1.0).abs() < 1e-9);
        // Implicit surface x^2 + (2y)^2 + z^2 = 1 has gradient (2x, 8y, 2z).
        let p = hit.ray.at(hit.t);
        let expected = Vec3::new(2.0 * p.x, 8.0 * p.y, 2.0 * p.z).normalize();
        assert!(
            (hit.normal - expected).length() < 1e-6,
            "normal {:?} vs expected {:?}",
            hit.normal,
            expected
        );
    }

    #[test]
    fn test_instance_bounding_box_is_transformed() {
        let instance = Instance::new(
            Matrix4::translation(10.0, 0.0, 0.0) * Matrix4::scale(2.0, 1.0, 1.0),
            unit_sphere(),
            None,
        )
        .expect("invertible");

        let bbox = instance.bounding_box();
        assert!((bbox.x.min - 8.0).abs() < 1e-9);
        assert!((bbox.x.max - 12.0).abs() < 1e-9);
        assert!((bbox.y.min + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_transform_is_rejected() {
        let result = Instance::new(Matrix4::scale(1.0, 0.0, 1.0), unit_sphere(), None);
        assert!(matches!(result, Err(SceneError::SingularTransform)));
    }

    #[test]
    fn test_shader_override_and_fallback() {
        let base = unit_sphere();
        let with_fallback =
            Instance::new(Matrix4::identity(), Arc::clone(&base), None).expect("invertible");
        assert!(std::ptr::eq(
            with_fallback.shader() as *const dyn Shader as *const (),
            base.shader() as *const dyn Shader as *const ()
        ));

        let override_shader: Arc<dyn Shader> = Arc::new(Solid::new(Color::ONE));
        let with_override = Instance::new(
            Matrix4::identity(),
            base,
            Some(Arc::clone(&override_shader)),
        )
        .expect("invertible");

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();
        assert!(with_override.intersect(&ray, &mut hit));
        assert!(std::ptr::eq(
            hit.shader as *const dyn Shader as *const (),
            override_shader.as_ref() as *const dyn Shader as *const ()
        ));
    }
}
