//! Scene graph and the recursive ray-casting engine.
//!
//! A [`SceneBuilder`] collects the camera, primitives, lights, and named
//! shaders handed over by the external scene loader, validates them, and
//! flattens the primitives into the BVH root. The resulting [`Scene`] is
//! immutable for the duration of the render and owns everything in it; the
//! worker threads read it concurrently without locking.

use std::collections::HashMap;
use std::sync::Arc;

use opal_math::{Basis, Ray, Vec3};
use rand::RngCore;

use crate::bvh::BvhNode;
use crate::camera::PerspectiveCamera;
use crate::error::SceneError;
use crate::light::Light;
use crate::primitive::{Intersection, Primitive};
use crate::sampler::{JitteredSampler, Sample};
use crate::shader::{Color, Shader};
use crate::EPSILON;

/// Default number of reflection bounces granted to a primary ray.
pub const MAX_REFLECTION_DEPTH: u32 = 6;

/// The color a reflection ray resolves to once its budget is exhausted.
const NEUTRAL: Color = Color::ZERO;

/// Collects and validates scene content before rendering.
pub struct SceneBuilder {
    camera: Option<PerspectiveCamera>,
    primitives: Vec<Box<dyn Primitive>>,
    lights: Vec<Box<dyn Light>>,
    shaders: HashMap<String, Arc<dyn Shader>>,
    ambient: Color,
    background: Color,
    samples_per_pixel: usize,
    reflection_budget: u32,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            camera: None,
            primitives: Vec::new(),
            lights: Vec::new(),
            shaders: HashMap::new(),
            ambient: Color::ZERO,
            background: Color::ZERO,
            samples_per_pixel: 1,
            reflection_budget: MAX_REFLECTION_DEPTH,
        }
    }

    pub fn with_camera(mut self, camera: PerspectiveCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Antialiasing samples per pixel. Must be a perfect square.
    pub fn with_samples_per_pixel(mut self, samples: usize) -> Self {
        self.samples_per_pixel = samples;
        self
    }

    pub fn with_reflection_budget(mut self, budget: u32) -> Self {
        self.reflection_budget = budget;
        self
    }

    /// Register a shader under a name for later lookup.
    pub fn define_shader(&mut self, name: impl Into<String>, shader: Arc<dyn Shader>) {
        self.shaders.insert(name.into(), shader);
    }

    /// Resolve a previously defined shader. An unknown name is a
    /// construction error; the caller aborts scene assembly.
    pub fn shader(&self, name: &str) -> Result<Arc<dyn Shader>, SceneError> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| SceneError::UnknownShader(name.to_string()))
    }

    pub fn add_primitive(&mut self, primitive: Box<dyn Primitive>) {
        self.primitives.push(primitive);
    }

    pub fn add_light(&mut self, light: Box<dyn Light>) {
        self.lights.push(light);
    }

    /// Validate and assemble the scene.
    ///
    /// Fails fast when no camera was set, the sample count is not a
    /// perfect square, or there are no primitives to build the BVH from.
    pub fn build(self) -> Result<Scene, SceneError> {
        let camera = self.camera.ok_or(SceneError::MissingCamera)?;

        let sample_grid = (self.samples_per_pixel as f64).sqrt() as usize;
        if self.samples_per_pixel == 0 || sample_grid * sample_grid != self.samples_per_pixel {
            return Err(SceneError::BadSampleCount(self.samples_per_pixel));
        }

        let primitive_count = self.primitives.len();
        let root = BvhNode::build(self.primitives)?;
        log::info!(
            "scene ready: {primitive_count} primitives, {} lights, {} shaders",
            self.lights.len(),
            self.shaders.len()
        );

        Ok(Scene {
            camera,
            root,
            lights: self.lights,
            shaders: self.shaders,
            ambient: self.ambient,
            background: self.background,
            sample_grid,
            reflection_budget: self.reflection_budget,
        })
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully assembled scene: one camera, the BVH over all primitives, the
/// light list, the shader table, and the ambient/background constants.
pub struct Scene {
    camera: PerspectiveCamera,
    root: BvhNode,
    lights: Vec<Box<dyn Light>>,
    shaders: HashMap<String, Arc<dyn Shader>>,
    ambient: Color,
    background: Color,
    sample_grid: usize,
    reflection_budget: u32,
}

impl Scene {
    /// The scene's ambient light term.
    pub fn ambient(&self) -> Color {
        self.ambient
    }

    /// The color rays that escape the scene resolve to.
    pub fn background(&self) -> Color {
        self.background
    }

    /// The scene's lights, for shaders to iterate.
    pub fn lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    /// Look up a shader in the scene's name table.
    pub fn shader(&self, name: &str) -> Result<Arc<dyn Shader>, SceneError> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| SceneError::UnknownShader(name.to_string()))
    }

    pub(crate) fn set_image_dimensions(&mut self, width: u32, height: u32) {
        self.camera.set_image_dimensions(width, height);
    }

    /// Compute the color of one pixel.
    ///
    /// With one sample per pixel a single ray goes through the pixel
    /// center. Otherwise a fresh stratified set drives one viewing ray per
    /// sample, and the same sample is handed down to shading so that
    /// area-light sampling stays correlated with the pixel jitter. The
    /// result is the unclamped average.
    pub fn raytrace_pixel(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
        if self.sample_grid == 1 {
            return self.trace_viewing_ray(x, y, Sample::new(0.5, 0.5));
        }

        let mut sampler = JitteredSampler::new();
        sampler.generate_grid(self.sample_grid, rng);
        let count = sampler.samples().len();

        let mut total = Color::ZERO;
        for _ in 0..count {
            total += self.trace_viewing_ray(x, y, sampler.current());
            sampler.advance();
        }
        total / count as f64
    }

    fn trace_viewing_ray(&self, x: u32, y: u32, sample: Sample) -> Color {
        let ray = self.camera.viewing_ray(f64::from(x), f64::from(y), sample);
        let mut hit = Intersection::default();
        if self.cast_ray(&ray, f64::MAX, &mut hit) {
            self.shade_intersection(&hit, sample, self.reflection_budget)
        } else {
            self.background
        }
    }

    /// Find the closest hit with `0 < t < max_t`.
    pub fn cast_ray<'a>(&'a self, ray: &Ray, max_t: f64, hit: &mut Intersection<'a>) -> bool {
        let mut candidate = Intersection::default();
        if self.root.intersect(ray, &mut candidate) && candidate.t > 0.0 && candidate.t < max_t {
            *hit = candidate;
            true
        } else {
            false
        }
    }

    /// Color an intersection by delegating to the hit object's shader.
    pub fn shade_intersection(&self, hit: &Intersection<'_>, sample: Sample, depth: u32) -> Color {
        hit.shader.shade(self, hit, sample, depth)
    }

    /// True when something blocks the path from `point` to the light.
    ///
    /// The shadow ray runs to the light's sampled position with an
    /// unnormalized direction, so the light itself sits at `t = 1` and a
    /// single `t < 1` test rejects occluders behind the light. The origin
    /// is nudged along the ray to keep the surface from shadowing itself.
    pub fn cast_shadow_ray(&self, light: &dyn Light, point: Vec3, sample: Sample) -> bool {
        let direction = light.sample_position(sample) - point;
        let shadow_ray = Ray::new(point + direction * EPSILON, direction);
        let mut hit = Intersection::default();
        self.cast_ray(&shadow_ray, 1.0, &mut hit)
    }

    /// Shade the mirror reflection of the ray that produced `hit`.
    ///
    /// Decrements the budget exactly once per call and short-circuits to
    /// the neutral color when it runs out, which is what bounds recursion
    /// between facing mirrors. A positive `roughness` perturbs the
    /// reflected direction inside a basis-aligned square, the same scheme
    /// area lights use for their surface samples.
    pub fn cast_reflection_ray(
        &self,
        hit: &Intersection<'_>,
        sample: Sample,
        depth: u32,
        roughness: f64,
    ) -> Color {
        if depth == 0 {
            return NEUTRAL;
        }

        let incoming = hit.ray.direction.normalize();
        let mut reflected = incoming - 2.0 * incoming.dot(hit.normal) * hit.normal;

        if roughness > 0.0 {
            let basis = Basis::from_w(reflected);
            reflected += roughness * (sample.x - 0.5) * basis.u()
                + roughness * (sample.y - 0.5) * basis.v();
        }

        let reflection = Ray::new(hit.point() + reflected * EPSILON, reflected);
        let mut next = Intersection::default();
        if self.cast_ray(&reflection, f64::MAX, &mut next) {
            self.shade_intersection(&next, sample, depth - 1)
        } else {
            self.background
        }
    }
}
