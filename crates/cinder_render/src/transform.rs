//! Rigid transforms over hittable surfaces.
//!
//! Rather than moving geometry, the incoming ray is transformed into the
//! inner surface's local space, the query delegated, and the resulting
//! hit mapped back into world space.

use std::sync::Arc;

use cinder_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

use crate::hittable::{HitRecord, Hittable};

/// Moves an inner surface by a fixed offset.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
    bbox: Aabb,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        let bbox = object.bounding_box().translate(offset);
        Self {
            object,
            offset,
            bbox,
        }
    }
}

impl Hittable for Translate {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn RngCore,
    ) -> bool {
        // Move the ray backwards by the offset
        let offset_ray = Ray::new(ray.origin() - self.offset, ray.direction(), ray.time());

        if !self.object.hit(&offset_ray, ray_t, rec, rng) {
            return false;
        }

        // Move the hit point forwards by the offset
        rec.p += self.offset;

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

/// Rotates an inner surface about the vertical (Y) axis.
pub struct RotateY {
    object: Arc<dyn Hittable>,
    sin_theta: f32,
    cos_theta: f32,
    bbox: Aabb,
}

impl RotateY {
    /// Create a rotation by `angle` degrees about the Y axis.
    pub fn new(object: Arc<dyn Hittable>, angle: f32) -> Self {
        let radians = angle.to_radians();
        let sin_theta = radians.sin();
        let cos_theta = radians.cos();

        // The rotated box is the axis-aligned envelope of the inner box's
        // eight rotated corners
        let inner = object.bounding_box();
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    let x = if i == 0 { inner.x.min } else { inner.x.max };
                    let y = if j == 0 { inner.y.min } else { inner.y.max };
                    let z = if k == 0 { inner.z.min } else { inner.z.max };

                    let new_x = cos_theta * x + sin_theta * z;
                    let new_z = -sin_theta * x + cos_theta * z;

                    let corner = Vec3::new(new_x, y, new_z);
                    min = min.min(corner);
                    max = max.max(corner);
                }
            }
        }

        Self {
            object,
            sin_theta,
            cos_theta,
            bbox: Aabb::from_points(min, max),
        }
    }

    /// World space to object space.
    fn to_object(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x - self.sin_theta * v.z,
            v.y,
            self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }

    /// Object space back to world space.
    fn to_world(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * v.x + self.sin_theta * v.z,
            v.y,
            -self.sin_theta * v.x + self.cos_theta * v.z,
        )
    }
}

impl Hittable for RotateY {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn RngCore,
    ) -> bool {
        // Rotate the ray into object space
        let rotated = Ray::new(
            self.to_object(ray.origin()),
            self.to_object(ray.direction()),
            ray.time(),
        );

        if !self.object.hit(&rotated, ray_t, rec, rng) {
            return false;
        }

        // Rotate the hit back into world space
        rec.p = self.to_world(rec.p);
        rec.normal = self.to_world(rec.normal);

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Material, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_sphere_at(center: Vec3) -> Arc<dyn Hittable> {
        let mat: Arc<dyn Material> = Arc::new(Lambertian::from_color(Vec3::splat(0.5)));
        Arc::new(Sphere::new(center, 1.0, mat))
    }

    #[test]
    fn test_translate_moves_hit_point() {
        let sphere = unit_sphere_at(Vec3::ZERO);
        let moved = Translate::new(sphere, Vec3::new(5.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(0);

        // The original position no longer hits
        let mut rec = HitRecord::default();
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert!(!moved.hit(
            &ray,
            Interval::new(0.001, f32::INFINITY),
            &mut rec,
            &mut rng
        ));

        // The translated position does, and the hit point is in world space
        let mut rec = HitRecord::default();
        let ray = Ray::new_simple(Vec3::new(5.0, 0.0, 5.0), -Vec3::Z);
        assert!(moved.hit(
            &ray,
            Interval::new(0.001, f32::INFINITY),
            &mut rec,
            &mut rng
        ));
        assert!((rec.p - Vec3::new(5.0, 0.0, 1.0)).length() < 1e-4);

        // Bounding box followed the offset
        assert!(moved.bounding_box().x.contains(5.0));
        assert!(!moved.bounding_box().x.contains(-1.0));
    }

    #[test]
    fn test_rotate_y_quarter_turn() {
        // Sphere at +X, rotated 90 degrees about Y, lands at -Z...
        // to_world maps object (x,z) to (x cos + z sin, -x sin + z cos):
        // (2,0) with theta=90 goes to (0,-2)
        let sphere = unit_sphere_at(Vec3::new(2.0, 0.0, 0.0));
        let rotated = RotateY::new(sphere, 90.0);
        let mut rng = StdRng::seed_from_u64(0);

        let mut rec = HitRecord::default();
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, -6.0), Vec3::Z);
        assert!(rotated.hit(
            &ray,
            Interval::new(0.001, f32::INFINITY),
            &mut rec,
            &mut rng
        ));
        assert!((rec.p.z - (-3.0)).abs() < 1e-3);

        // Normal is mapped back to world space and faces the ray
        assert!(rec.normal.dot(ray.direction()) < 0.0);

        // The rotated bounding box covers the new position
        let bbox = rotated.bounding_box();
        assert!(bbox.z.contains(-2.0));
        assert!(bbox.x.contains(0.0));
    }

    #[test]
    fn test_rotate_y_zero_angle_is_identity() {
        let sphere = unit_sphere_at(Vec3::new(0.0, 0.0, -3.0));
        let rotated = RotateY::new(sphere, 0.0);
        let mut rng = StdRng::seed_from_u64(0);

        let mut rec = HitRecord::default();
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);
        assert!(rotated.hit(
            &ray,
            Interval::new(0.001, f32::INFINITY),
            &mut rec,
            &mut rng
        ));
        assert!((rec.t - 2.0).abs() < 1e-4);
        assert!((rec.p - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-4);
    }
}
