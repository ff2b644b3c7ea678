//! Perspective camera.

use opal_math::{Basis, Ray, Vec3};

use crate::sampler::Sample;

/// A pinhole perspective camera.
///
/// Viewing rays start at the camera position and pass through a view plane
/// `view_plane_dist` in front of it. The plane is `view_plane_width` world
/// units wide; its height follows the image's aspect ratio. Pixel row 0 is
/// the bottom of the image.
pub struct PerspectiveCamera {
    position: Vec3,
    basis: Basis,
    view_plane_dist: f64,
    view_plane_width: f64,
    image_width: f64,
    image_height: f64,
}

impl PerspectiveCamera {
    /// Create a camera at `position` looking along `direction`, with +Y up.
    pub fn new(position: Vec3, direction: Vec3, view_plane_dist: f64, view_plane_width: f64) -> Self {
        Self {
            position,
            basis: Basis::from_w_up(direction, Vec3::Y),
            view_plane_dist,
            view_plane_width,
            image_width: 0.0,
            image_height: 0.0,
        }
    }

    /// Tell the camera the output image's pixel dimensions. Must be called
    /// before generating viewing rays; the render entry point does this.
    pub fn set_image_dimensions(&mut self, width: u32, height: u32) {
        self.image_width = f64::from(width);
        self.image_height = f64::from(height);
    }

    /// The viewing ray through pixel `(x, y)`, offset within the pixel by
    /// `sample` (use `(0.5, 0.5)` for the pixel center).
    pub fn viewing_ray(&self, x: f64, y: f64, sample: Sample) -> Ray {
        let screen_width = self.view_plane_width;
        let screen_height = screen_width * self.image_height / self.image_width;
        let right = screen_width / 2.0;
        let left = -right;
        let top = screen_height / 2.0;
        let bottom = -top;

        let u = left + (right - left) * (x + sample.x) / self.image_width;
        let v = bottom + (top - bottom) * (y + sample.y) / self.image_height;

        let direction = -self.view_plane_dist * self.basis.w()
            + u * self.basis.u()
            + v * self.basis.v();

        Ray::new(self.position, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> PerspectiveCamera {
        let mut camera =
            PerspectiveCamera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 1.0, 2.0);
        camera.set_image_dimensions(100, 100);
        camera
    }

    #[test]
    fn test_center_ray_points_down_view_direction() {
        let camera = test_camera();
        let ray = camera.viewing_ray(49.5, 49.5, Sample::new(0.5, 0.5));
        assert_eq!(ray.origin, Vec3::ZERO);
        let dir = ray.direction.normalize();
        assert!((dir - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
    }

    #[test]
    fn test_row_zero_is_image_bottom() {
        let camera = test_camera();
        let bottom = camera.viewing_ray(50.0, 0.0, Sample::new(0.5, 0.5));
        let top = camera.viewing_ray(50.0, 99.0, Sample::new(0.5, 0.5));
        assert!(bottom.direction.y < 0.0, "row 0 must look downward");
        assert!(top.direction.y > 0.0, "last row must look upward");
    }

    #[test]
    fn test_sample_offsets_stay_inside_pixel() {
        let camera = test_camera();
        let low = camera.viewing_ray(10.0, 10.0, Sample::new(0.0, 0.0));
        let high = camera.viewing_ray(10.0, 10.0, Sample::new(0.99, 0.99));
        let next = camera.viewing_ray(11.0, 10.0, Sample::new(0.0, 0.0));

        // Jitter moves the ray, but never past the next pixel's corner ray.
        assert!(low.direction != high.direction);
        let pixel_step = (next.direction - low.direction).length();
        assert!((high.direction - low.direction).length() < pixel_step * 1.5);
    }
}
