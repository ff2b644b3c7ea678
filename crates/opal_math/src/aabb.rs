use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box used by the BVH for fast rejection tests.
///
/// Defined by three intervals, one per axis. Non-empty boxes maintain
/// `min <= max` on every axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self::new(
            Interval::new(a.x.min(b.x), a.x.max(b.x)),
            Interval::new(a.y.min(b.y), a.y.max(b.y)),
            Interval::new(a.z.min(b.z), a.z.max(b.z)),
        )
    }

    /// Create the smallest AABB containing every point in the set.
    pub fn from_point_set(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Aabb::EMPTY;
        }
        let mut min = Vec3::splat(f64::INFINITY);
        let mut max = Vec3::splat(f64::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self::from_points(min, max)
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// The minimum corner.
    pub fn min_point(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// The maximum corner.
    pub fn max_point(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// The center of the box. The BVH sorts primitives by this point.
    pub fn center(&self) -> Vec3 {
        (self.min_point() + self.max_point()) * 0.5
    }

    /// Test if a ray intersects this AABB, using the slab method.
    ///
    /// A ray parallel to a slab produces infinite slab times; IEEE
    /// arithmetic resolves those to the correct hit/miss answer without
    /// a special case.
    pub fn hit(&self, ray: &Ray) -> bool {
        // X slab.
        let mut t_min = (self.x.min - ray.origin.x) / ray.direction.x;
        let mut t_max = (self.x.max - ray.origin.x) / ray.direction.x;
        if ray.direction.x < 0.0 {
            std::mem::swap(&mut t_min, &mut t_max);
        }

        // Y slab.
        let mut ty_min = (self.y.min - ray.origin.y) / ray.direction.y;
        let mut ty_max = (self.y.max - ray.origin.y) / ray.direction.y;
        if ray.direction.y < 0.0 {
            std::mem::swap(&mut ty_min, &mut ty_max);
        }

        if t_min > ty_max || ty_min > t_max {
            return false;
        }
        t_min = t_min.max(ty_min);
        t_max = t_max.min(ty_max);

        // Z slab.
        let mut tz_min = (self.z.min - ray.origin.z) / ray.direction.z;
        let mut tz_max = (self.z.max - ray.origin.z) / ray.direction.z;
        if ray.direction.z < 0.0 {
            std::mem::swap(&mut tz_min, &mut tz_max);
        }

        !(t_min > tz_max || tz_min > t_max)
    }

    /// Pad intervals so flat boxes (triangles, axis-aligned faces) keep a
    /// usable slab on every axis.
    fn pad_to_minimums(&mut self) {
        let delta = 1e-4;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}
