//! Flat quadrilateral primitive and the box builder composed from it.

use std::sync::Arc;

use cinder_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

use crate::hittable::{HitRecord, Hittable, HittableList};
use crate::Material;

/// A planar parallelogram defined by a corner point and two edge vectors.
pub struct Quad {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    material: Arc<dyn Material>,
    bbox: Aabb,
    normal: Vec3,
    d: f32,
}

impl Quad {
    /// Create a quad from corner `q` spanning edges `u` and `v`.
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: Arc<dyn Material>) -> Self {
        let n = u.cross(v);
        let normal = n.normalize();
        let d = normal.dot(q);
        // Converts a plane hit point into the quad's (alpha, beta) basis
        let w = n / n.dot(n);

        let bbox_diag1 = Aabb::from_points(q, q + u + v);
        let bbox_diag2 = Aabb::from_points(q + u, q + v);
        let bbox = Aabb::surrounding(&bbox_diag1, &bbox_diag2);

        Self {
            q,
            u,
            v,
            w,
            material,
            bbox,
            normal,
            d,
        }
    }

    /// Interior test in plane coordinates, boundary-inclusive on [0, 1].
    fn is_interior(alpha: f32, beta: f32) -> bool {
        let unit = Interval::new(0.0, 1.0);
        unit.contains(alpha) && unit.contains(beta)
    }
}

impl Hittable for Quad {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        _rng: &mut dyn RngCore,
    ) -> bool {
        let denom = self.normal.dot(ray.direction());

        // No hit if the ray is parallel to the plane
        if denom.abs() < 1e-8 {
            return false;
        }

        // Reject if the plane crossing lies outside the ray interval
        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        if !ray_t.contains(t) {
            return false;
        }

        // Locate the crossing within the quad's plane basis
        let intersection = ray.at(t);
        let planar_hit = intersection - self.q;
        let alpha = self.w.dot(planar_hit.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar_hit));

        if !Self::is_interior(alpha, beta) {
            return false;
        }

        rec.t = t;
        rec.p = intersection;
        rec.u = alpha;
        rec.v = beta;
        rec.material = self.material.as_ref();
        rec.set_face_normal(ray, self.normal);

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

/// Build the six-quad box spanning the two opposite corners a and b.
pub fn cuboid(a: Vec3, b: Vec3, material: Arc<dyn Material>) -> HittableList {
    let mut sides = HittableList::new();

    let min = a.min(b);
    let max = a.max(b);

    let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
    let dy = Vec3::new(0.0, max.y - min.y, 0.0);
    let dz = Vec3::new(0.0, 0.0, max.z - min.z);

    // front
    sides.add(Arc::new(Quad::new(
        Vec3::new(min.x, min.y, max.z),
        dx,
        dy,
        material.clone(),
    )));
    // right
    sides.add(Arc::new(Quad::new(
        Vec3::new(max.x, min.y, max.z),
        -dz,
        dy,
        material.clone(),
    )));
    // back
    sides.add(Arc::new(Quad::new(
        Vec3::new(max.x, min.y, min.z),
        -dx,
        dy,
        material.clone(),
    )));
    // left
    sides.add(Arc::new(Quad::new(
        Vec3::new(min.x, min.y, min.z),
        dz,
        dy,
        material.clone(),
    )));
    // top
    sides.add(Arc::new(Quad::new(
        Vec3::new(min.x, max.y, max.z),
        dx,
        -dz,
        material.clone(),
    )));
    // bottom
    sides.add(Arc::new(Quad::new(
        Vec3::new(min.x, min.y, min.z),
        dx,
        dz,
        material,
    )));

    sides
}
