//! Sphere primitive, static or moving linearly over the shutter interval.

use std::f32::consts::PI;
use std::sync::Arc;

use cinder_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

use crate::hittable::{HitRecord, Hittable};
use crate::Material;

/// A sphere primitive.
///
/// A moving sphere interpolates its center linearly over the ray time
/// range [0, 1]; its bounding box covers the whole sweep.
pub struct Sphere {
    center1: Vec3,
    center_vec: Vec3,
    is_moving: bool,
    radius: f32,
    material: Arc<dyn Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a stationary sphere.
    pub fn new(center: Vec3, radius: f32, material: Arc<dyn Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        log::trace!(
            "Creating sphere at ({:.2},{:.2},{:.2}) with radius {:.2}",
            center.x,
            center.y,
            center.z,
            radius
        );

        Self {
            center1: center,
            center_vec: Vec3::ZERO,
            is_moving: false,
            radius,
            material,
            bbox,
        }
    }

    /// Create a sphere moving from center1 (t=0) to center2 (t=1).
    pub fn new_moving(
        center1: Vec3,
        center2: Vec3,
        radius: f32,
        material: Arc<dyn Material>,
    ) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let box1 = Aabb::from_points(center1 - rvec, center1 + rvec);
        let box2 = Aabb::from_points(center2 - rvec, center2 + rvec);

        log::trace!(
            "Creating moving sphere from ({:.2},{:.2},{:.2}) to ({:.2},{:.2},{:.2})",
            center1.x,
            center1.y,
            center1.z,
            center2.x,
            center2.y,
            center2.z
        );

        Self {
            center1,
            center_vec: center2 - center1,
            is_moving: true,
            radius,
            material,
            bbox: Aabb::surrounding(&box1, &box2),
        }
    }

    /// Effective center at the given ray time.
    fn center(&self, time: f32) -> Vec3 {
        self.center1 + time * self.center_vec
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> (f32, f32) {
        // p is a point on the unit sphere centered at origin
        // theta: angle down from +Y
        // phi: angle around Y axis from +X
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        let u = phi / (2.0 * PI);
        let v = theta / PI;
        (u, v)
    }
}

impl Hittable for Sphere {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        _rng: &mut dyn RngCore,
    ) -> bool {
        let center = if self.is_moving {
            self.center(ray.time())
        } else {
            self.center1
        };

        let oc = center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return false;
            }
        }

        rec.t = root;
        rec.p = ray.at(rec.t);
        let outward_normal = (rec.p - center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        (rec.u, rec.v) = Self::get_sphere_uv(outward_normal);
        rec.material = self.material.as_ref();

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
