//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over a collection of surfaces, built once and queried
//! per ray. Traversal prunes whole subtrees with the slab test before any
//! exact primitive intersection runs.

use std::sync::Arc;
use std::time::Instant;

use cinder_math::{Aabb, Interval, Ray};
use rand::RngCore;

use crate::hittable::{HitRecord, Hittable, HittableList};

/// BVH node - an internal branch, a single-surface leaf, or empty.
///
/// A closed enum keeps traversal free of dynamic dispatch until a leaf's
/// surface is reached.
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    /// Leaf node holding one surface.
    Leaf { object: Arc<dyn Hittable>, bbox: Aabb },
    /// Empty node (for edge cases).
    Empty,
}

impl BvhNode {
    /// Build a BVH from a collection of surfaces.
    pub fn new(objects: Vec<Arc<dyn Hittable>>) -> Self {
        if objects.is_empty() {
            return BvhNode::Empty;
        }

        let count = objects.len();
        let start = Instant::now();
        let root = Self::build(objects);
        log::debug!("Built BVH over {} objects in {:?}", count, start.elapsed());

        root
    }

    /// Build a BVH sharing the surfaces of a list.
    pub fn from_list(list: &HittableList) -> Self {
        Self::new(list.objects().to_vec())
    }

    /// Recursive construction.
    ///
    /// Median split: sort surfaces by bounding-box centroid along the
    /// axis with the largest centroid spread, halve, recurse.
    fn build(mut objects: Vec<Arc<dyn Hittable>>) -> Self {
        let n = objects.len();

        // Bounding box of all covered surfaces, cached on the node
        let bounds = objects
            .iter()
            .map(|o| o.bounding_box())
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b));

        if n == 1 {
            return BvhNode::Leaf {
                object: objects.pop().unwrap(),
                bbox: bounds,
            };
        }

        // Choose the split axis from the centroid spread
        let centroid_bounds = objects.iter().fold(Aabb::EMPTY, |acc, obj| {
            let c = obj.bounding_box().centroid();
            Aabb::surrounding(&acc, &Aabb::from_points(c, c))
        });
        let axis = centroid_bounds.longest_axis();

        // Sort surfaces by centroid on the chosen axis
        objects.sort_unstable_by(|a, b| {
            let a_val = a.bounding_box().centroid()[axis];
            let b_val = b.bounding_box().centroid()[axis];
            a_val
                .partial_cmp(&b_val)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if n == 2 {
            let right = objects.pop().unwrap();
            let left = objects.pop().unwrap();
            return BvhNode::Branch {
                left: Box::new(BvhNode::Leaf {
                    bbox: left.bounding_box(),
                    object: left,
                }),
                right: Box::new(BvhNode::Leaf {
                    bbox: right.bounding_box(),
                    object: right,
                }),
                bbox: bounds,
            };
        }

        // Split at the midpoint and recurse
        let right_objects = objects.split_off(n / 2);
        let left_objects = objects;

        BvhNode::Branch {
            left: Box::new(Self::build(left_objects)),
            right: Box::new(Self::build(right_objects)),
            bbox: bounds,
        }
    }
}

impl Hittable for BvhNode {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn RngCore,
    ) -> bool {
        match self {
            BvhNode::Empty => false,

            BvhNode::Leaf { object, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }
                object.hit(ray, ray_t, rec, rng)
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return false;
                }

                let hit_left = left.hit(ray, ray_t, rec, rng);

                // Only search the right subtree up to the closest hit so far
                let right_max = if hit_left { rec.t } else { ray_t.max };
                let hit_right = right.hit(ray, Interval::new(ray_t.min, right_max), rec, rng);

                hit_left || hit_right
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }
}
