//! The primitive trait and the intersection record it fills in.

use opal_math::{Aabb, Ray, Vec3};

use crate::sampler::Sample;
use crate::scene::Scene;
use crate::shader::{Color, Shader};

/// A shader that absorbs everything. Only used so that a default-constructed
/// [`Intersection`] has something to point at.
struct NullShader;

impl Shader for NullShader {
    fn shade(&self, _scene: &Scene, _hit: &Intersection<'_>, _sample: Sample, _depth: u32) -> Color {
        Color::ZERO
    }
}

static NULL_SHADER: NullShader = NullShader;

/// Record of a ray-primitive intersection.
///
/// Carries everything shading needs: the world-space ray that produced the
/// hit, the hit parameter `t`, the unit surface normal there, and a borrow
/// of the hit object's shader. The reflection budget and the active sample
/// are threaded through the shading calls by value, not stored here.
#[derive(Clone, Copy)]
pub struct Intersection<'a> {
    /// The ray that collided with the object, in world space.
    pub ray: Ray,
    /// Parametric distance along the ray where the hit occurred. When the
    /// ray pierces the object more than once this is the smallest
    /// non-negative crossing.
    pub t: f64,
    /// Unit surface normal at the hit point.
    pub normal: Vec3,
    /// The hit object's shader.
    pub shader: &'a dyn Shader,
}

impl Intersection<'_> {
    /// The world-space hit point.
    pub fn point(&self) -> Vec3 {
        self.ray.at(self.t)
    }
}

impl Default for Intersection<'_> {
    fn default() -> Self {
        Self {
            ray: Ray::new(Vec3::ZERO, Vec3::Y),
            t: 0.0,
            normal: Vec3::Y,
            shader: &NULL_SHADER,
        }
    }
}

/// An object rays can intersect.
pub trait Primitive: Send + Sync {
    /// Test the ray against this object.
    ///
    /// Returns true and fills `hit` when the ray strikes the surface; the
    /// reported `t` is the smallest non-negative crossing. On a false
    /// return `hit` is left unspecified.
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool;

    /// The axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// The shader associated with this object.
    fn shader(&self) -> &dyn Shader;
}
