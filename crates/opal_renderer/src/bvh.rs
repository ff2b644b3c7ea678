//! Bounding volume hierarchy.
//!
//! A binary tree over the scene's primitives, built once at scene
//! construction and read-only afterwards, so concurrent traversal from the
//! worker threads needs no locking.

use opal_math::{Aabb, Ray, Vec3};

use crate::error::SceneError;
use crate::primitive::{Intersection, Primitive};
use crate::shader::Shader;

/// A node of the hierarchy: a leaf holding one or two primitives, or a
/// branch with exactly two children and the union of their boxes.
///
/// Nodes own their subtrees, so dropping the root tears the tree down
/// structurally.
pub enum BvhNode {
    Leaf {
        objects: Vec<Box<dyn Primitive>>,
        bbox: Aabb,
    },
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
}

fn axis_value(v: Vec3, axis: usize) -> f64 {
    match axis {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}

impl BvhNode {
    /// Build a hierarchy owning the given primitives.
    ///
    /// An empty list is a scene-construction error, never a silently empty
    /// tree.
    pub fn build(objects: Vec<Box<dyn Primitive>>) -> Result<Self, SceneError> {
        let with_boxes = objects
            .into_iter()
            .map(|object| (object.bounding_box(), object))
            .collect();
        let root = Self::build_recursive(with_boxes, 0)?;
        Ok(root)
    }

    /// Recursive median split. The sort dimension cycles x, y, z with tree
    /// depth, which keeps the tree balanced without measuring extents.
    fn build_recursive(
        mut objects: Vec<(Aabb, Box<dyn Primitive>)>,
        depth: usize,
    ) -> Result<Self, SceneError> {
        match objects.len() {
            0 => return Err(SceneError::EmptyScene),
            1 | 2 => {
                let bbox = objects
                    .iter()
                    .map(|(bbox, _)| *bbox)
                    .reduce(|a, b| Aabb::surrounding(&a, &b))
                    .unwrap_or(Aabb::EMPTY);
                let objects = objects.into_iter().map(|(_, object)| object).collect();
                return Ok(BvhNode::Leaf { objects, bbox });
            }
            _ => {}
        }

        let axis = depth % 3;
        objects.sort_by(|a, b| {
            let a_center = axis_value(a.0.center(), axis);
            let b_center = axis_value(b.0.center(), axis);
            a_center
                .partial_cmp(&b_center)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let right_objects = objects.split_off(objects.len() / 2);
        let left = Self::build_recursive(objects, depth + 1)?;
        let right = Self::build_recursive(right_objects, depth + 1)?;

        let bbox = Aabb::surrounding(&left.bounding_box(), &right.bounding_box());
        Ok(BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox,
        })
    }
}

impl Primitive for BvhNode {
    fn intersect<'a>(&'a self, ray: &Ray, hit: &mut Intersection<'a>) -> bool {
        match self {
            BvhNode::Leaf { objects, bbox } => {
                if !bbox.hit(ray) {
                    return false;
                }

                let mut found = false;
                let mut candidate = Intersection::default();
                for object in objects {
                    if object.intersect(ray, &mut candidate)
                        && candidate.t >= 0.0
                        && (!found || candidate.t < hit.t)
                    {
                        *hit = candidate;
                        found = true;
                    }
                }
                found
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray) {
                    return false;
                }

                let mut left_hit = Intersection::default();
                let mut right_hit = Intersection::default();
                // Hits behind the ray origin are discarded here no matter
                // what a child reported.
                let left_found = left.intersect(ray, &mut left_hit) && left_hit.t >= 0.0;
                let right_found = right.intersect(ray, &mut right_hit) && right_hit.t >= 0.0;

                match (left_found, right_found) {
                    (false, false) => false,
                    (true, false) => {
                        *hit = left_hit;
                        true
                    }
                    (false, true) => {
                        *hit = right_hit;
                        true
                    }
                    (true, true) => {
                        *hit = if right_hit.t < left_hit.t {
                            right_hit
                        } else {
                            left_hit
                        };
                        true
                    }
                }
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    /// Internal nodes have no shader; asking for one is a programming
    /// error, not a runtime condition.
    fn shader(&self) -> &dyn Shader {
        panic!("shader requested on an internal BVH node");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{Color, Solid};
    use crate::sphere::Sphere;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn gray() -> Arc<dyn Shader> {
        Arc::new(Solid::new(Color::splat(0.5)))
    }

    fn sphere_at(center: Vec3, radius: f64) -> Box<dyn Primitive> {
        Box::new(Sphere::new(center, radius, gray()))
    }

    fn random_spheres(rng: &mut StdRng, count: usize) -> Vec<Box<dyn Primitive>> {
        (0..count)
            .map(|_| {
                let center = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                );
                sphere_at(center, rng.gen_range(0.2..1.5))
            })
            .collect()
    }

    /// Reference result: linear scan over every primitive.
    fn brute_force<'a>(
        objects: &'a [Box<dyn Primitive>],
        ray: &Ray,
        hit: &mut Intersection<'a>,
    ) -> bool {
        let mut found = false;
        let mut candidate = Intersection::default();
        for object in objects {
            if object.intersect(ray, &mut candidate)
                && candidate.t >= 0.0
                && (!found || candidate.t < hit.t)
            {
                *hit = candidate;
                found = true;
            }
        }
        found
    }

    #[test]
    fn test_bvh_empty_list_fails() {
        assert!(matches!(
            BvhNode::build(Vec::new()),
            Err(SceneError::EmptyScene)
        ));
    }

    #[test]
    fn test_bvh_single_primitive_is_a_leaf() {
        let bvh = BvhNode::build(vec![sphere_at(Vec3::new(0.0, 0.0, -5.0), 1.0)])
            .expect("non-empty scene");
        assert!(matches!(&bvh, BvhNode::Leaf { objects, .. } if objects.len() == 1));

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();
        assert!(bvh.intersect(&ray, &mut hit));
        assert!((hit.t - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_bvh_two_primitives_share_a_leaf() {
        let bvh = BvhNode::build(vec![
            sphere_at(Vec3::new(-2.0, 0.0, -5.0), 1.0),
            sphere_at(Vec3::new(2.0, 0.0, -5.0), 1.0),
        ])
        .expect("non-empty scene");
        assert!(matches!(&bvh, BvhNode::Leaf { objects, .. } if objects.len() == 2));
    }

    #[test]
    fn test_bvh_three_primitives_branch() {
        let bvh = BvhNode::build(vec![
            sphere_at(Vec3::new(-4.0, 0.0, -5.0), 1.0),
            sphere_at(Vec3::new(0.0, 0.0, -5.0), 1.0),
            sphere_at(Vec3::new(4.0, 0.0, -5.0), 1.0),
        ])
        .expect("non-empty scene");
        assert!(matches!(&bvh, BvhNode::Branch { .. }));

        // Closest of the overlapping candidates wins.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let mut hit = Intersection::default();
        assert!(bvh.intersect(&ray, &mut hit));
        assert!((hit.t - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_bvh_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(2024);
        let objects = random_spheres(&mut rng, 64);
        // Build a second, identical set so the BVH can own its copy.
        let mut rng2 = StdRng::seed_from_u64(2024);
        let owned = random_spheres(&mut rng2, 64);
        let bvh = BvhNode::build(owned).expect("non-empty scene");

        for _ in 0..200 {
            let origin = Vec3::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
            );
            let direction = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if direction.length_squared() < 1e-6 {
                continue;
            }
            let ray = Ray::new(origin, direction);

            let mut expected = Intersection::default();
            let mut actual = Intersection::default();
            let expected_found = brute_force(&objects, &ray, &mut expected);
            let actual_found = bvh.intersect(&ray, &mut actual);

            assert_eq!(expected_found, actual_found, "hit/miss disagreement");
            if expected_found {
                assert!(
                    (expected.t - actual.t).abs() < 1e-9,
                    "nearest-hit distance disagreement: {} vs {}",
                    expected.t,
                    actual.t
                );
                assert!(
                    (expected.normal - actual.normal).length() < 1e-9,
                    "hit object disagreement"
                );
            }
        }
    }

    #[test]
    fn test_bvh_bounding_box_is_union() {
        let bvh = BvhNode::build(vec![
            sphere_at(Vec3::new(-5.0, 0.0, 0.0), 1.0),
            sphere_at(Vec3::new(5.0, 0.0, 0.0), 1.0),
            sphere_at(Vec3::new(0.0, 7.0, 0.0), 1.0),
        ])
        .expect("non-empty scene");

        let bbox = bvh.bounding_box();
        assert!((bbox.x.min + 6.0).abs() < 1e-12);
        assert!((bbox.x.max - 6.0).abs() < 1e-12);
        assert!((bbox.y.max - 8.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "internal BVH node")]
    fn test_bvh_shader_panics() {
        let bvh = BvhNode::build(vec![sphere_at(Vec3::ZERO, 1.0)]).expect("non-empty scene");
        let _ = bvh.shader();
    }
}
