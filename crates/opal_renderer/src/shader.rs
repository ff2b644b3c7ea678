//! Surface shaders.
//!
//! Shaders hold only their own coefficients. Engine services — the ambient
//! term, the light list, shadow visibility, and reflection rays — are
//! reached through the [`Scene`] reference passed into [`Shader::shade`],
//! together with the active stratified sample and the remaining reflection
//! budget.

use opal_math::Vec3;

use crate::primitive::Intersection;
use crate::sampler::Sample;
use crate::scene::Scene;
use crate::EPSILON;

/// Color type alias (linear RGB, unclamped).
pub type Color = Vec3;

/// Computes the color of a ray intersection.
pub trait Shader: Send + Sync {
    /// Calculate the color at `hit`. `depth` is the remaining reflection
    /// budget for this ray; `sample` is the stratified sample shared with
    /// the primary ray, used for area-light and rough-reflection jitter.
    fn shade(&self, scene: &Scene, hit: &Intersection<'_>, sample: Sample, depth: u32) -> Color;
}

/// Ambient plus per-light Lambertian diffuse for the given albedo.
///
/// Shared by the diffuse shaders; each unoccluded light contributes
/// `diffuse * radiance * max(0, N.L)`.
fn diffuse_shade(scene: &Scene, hit: &Intersection<'_>, sample: Sample, diffuse: Color) -> Color {
    let normal = hit.normal;
    let point = hit.point();

    let mut color = scene.ambient() * diffuse;
    for light in scene.lights() {
        if scene.cast_shadow_ray(light.as_ref(), point, sample) {
            continue;
        }
        let light_dir = (light.position() - point).normalize();
        let n_dot_l = normal.dot(light_dir).max(0.0);
        color += diffuse * light.radiance(point) * n_dot_l;
    }
    color
}

/// Purely diffuse (cosine-weighted) surface.
pub struct Lambertian {
    diffuse: Color,
}

impl Lambertian {
    pub fn new(diffuse: Color) -> Self {
        Self { diffuse }
    }
}

impl Shader for Lambertian {
    fn shade(&self, scene: &Scene, hit: &Intersection<'_>, sample: Sample, _depth: u32) -> Color {
        diffuse_shade(scene, hit, sample, self.diffuse)
    }
}

/// Blinn-Phong surface with an optional mirror term.
pub struct BlinnPhong {
    diffuse: Color,
    specular: Color,
    phong_exp: f64,
    mirror: f64,
}

impl BlinnPhong {
    /// `mirror` in `[0, 1]` blends the local diffuse result with a
    /// reflection ray; zero disables reflection entirely.
    pub fn new(diffuse: Color, specular: Color, phong_exp: f64, mirror: f64) -> Self {
        Self {
            diffuse,
            specular,
            phong_exp,
            mirror,
        }
    }
}

impl Shader for BlinnPhong {
    fn shade(&self, scene: &Scene, hit: &Intersection<'_>, sample: Sample, depth: u32) -> Color {
        let normal = hit.normal;
        let point = hit.point();
        let view_dir = (-hit.ray.direction).normalize();

        let mut diffuse_sum = scene.ambient() * self.diffuse;
        let mut specular_sum = Color::ZERO;

        for light in scene.lights() {
            if scene.cast_shadow_ray(light.as_ref(), point, sample) {
                continue;
            }
            let light_dir = (light.position() - point).normalize();
            let half_dir = (light_dir + view_dir).normalize();
            let radiance = light.radiance(point);

            diffuse_sum += self.diffuse * radiance * normal.dot(light_dir).max(0.0);
            specular_sum +=
                self.specular * radiance * normal.dot(half_dir).max(0.0).powf(self.phong_exp);
        }

        let mut color = if self.mirror > EPSILON {
            let reflected = scene.cast_reflection_ray(hit, sample, depth, 0.0);
            diffuse_sum * (1.0 - self.mirror) + reflected * self.mirror
        } else {
            diffuse_sum
        };
        color += specular_sum;
        color
    }
}

/// Diffuse surface with a mirror glaze on top.
pub struct Glaze {
    diffuse: Color,
    mirror: f64,
    roughness: f64,
}

impl Glaze {
    /// `roughness` widens the reflection lobe by jittering the reflected
    /// direction with the active sample; zero gives a perfect mirror.
    pub fn new(diffuse: Color, mirror: f64, roughness: f64) -> Self {
        Self {
            diffuse,
            mirror,
            roughness,
        }
    }
}

impl Shader for Glaze {
    fn shade(&self, scene: &Scene, hit: &Intersection<'_>, sample: Sample, depth: u32) -> Color {
        let local = diffuse_shade(scene, hit, sample, self.diffuse);
        let reflected = scene.cast_reflection_ray(hit, sample, depth, self.roughness);
        local * (1.0 - self.mirror) + reflected * self.mirror
    }
}

/// Unconditional color, independent of lighting.
pub struct Solid {
    color: Color,
}

impl Solid {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Shader for Solid {
    fn shade(&self, _scene: &Scene, _hit: &Intersection<'_>, _sample: Sample, _depth: u32) -> Color {
        self.color
    }
}
