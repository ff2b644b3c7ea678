//! Light sources.

use opal_math::{Basis, Vec3};

use crate::sampler::Sample;
use crate::shader::Color;

/// A light source.
pub trait Light: Send + Sync {
    /// The radiance the light casts at `point`, assuming nothing is in the
    /// way.
    fn radiance(&self, point: Vec3) -> Color;

    /// The light's position; for lights with extent, its center.
    fn position(&self) -> Vec3;

    /// A position on the light's surface for the given sample. Point-like
    /// lights ignore the sample.
    fn sample_position(&self, _sample: Sample) -> Vec3 {
        self.position()
    }
}

/// A light that radiates equally from a single point.
pub struct PointLight {
    position: Vec3,
    radiance: Color,
}

impl PointLight {
    pub fn new(position: Vec3, radiance: Color) -> Self {
        Self { position, radiance }
    }
}

impl Light for PointLight {
    fn radiance(&self, _point: Vec3) -> Color {
        self.radiance
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

/// A rectangular light. Sampling positions across its surface with the
/// per-pixel stratified samples is what turns hard shadow edges into
/// penumbrae.
pub struct AreaLight {
    position: Vec3,
    intensity: Color,
    basis: Basis,
    width: f64,
    height: f64,
}

impl AreaLight {
    /// `position` is the center of the rectangle, which lies in the plane
    /// orthogonal to `normal`.
    pub fn new(position: Vec3, normal: Vec3, intensity: Color, width: f64, height: f64) -> Self {
        Self {
            position,
            intensity,
            basis: Basis::from_w(normal),
            width,
            height,
        }
    }
}

impl Light for AreaLight {
    fn radiance(&self, _point: Vec3) -> Color {
        self.intensity
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn sample_position(&self, sample: Sample) -> Vec3 {
        // Stay in the light plane: offset only along u and v.
        let u = self.width * (sample.x - 0.5);
        let v = self.height * (sample.y - 0.5);
        self.position + u * self.basis.u() + v * self.basis.v()
    }
}
