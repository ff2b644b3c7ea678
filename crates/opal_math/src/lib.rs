//! Double-precision math types for the Opal renderer.
//!
//! The engine targets f64 scalar arithmetic throughout; the vector and
//! sample value types come from glam (`DVec3`/`DVec2`).

pub use glam::{DVec2, DVec3};

/// The 3-vector used for points, directions, and colors.
pub type Vec3 = DVec3;

mod aabb;
mod basis;
mod interval;
mod matrix;
mod ray;

pub use aabb::Aabb;
pub use basis::Basis;
pub use interval::Interval;
pub use matrix::{Matrix4, MatrixRow, RowOp, MATRIX_DIM};
pub use ray::Ray;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_is_double_precision() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(std::mem::size_of_val(&v.x), 8);
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
    }
}
