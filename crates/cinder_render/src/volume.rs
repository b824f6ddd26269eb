//! Constant-density participating medium bounded by another surface.

use std::sync::Arc;

use cinder_core::Texture;
use cinder_math::{Aabb, Interval, Ray, Vec3};
use rand::RngCore;

use crate::hittable::{HitRecord, Hittable};
use crate::material::{Color, Isotropic};
use crate::rng::gen_f32;

/// A volume of constant density inside a boundary surface.
///
/// Intersection is stochastic: each query samples a free-flight distance,
/// so repeated queries with the same ray give different results by design.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f32,
    phase_function: Isotropic,
}

impl ConstantMedium {
    /// Create a medium with the given density and phase-function texture.
    pub fn new(boundary: Arc<dyn Hittable>, density: f32, albedo: Arc<dyn Texture>) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::new(albedo),
        }
    }

    /// Create a medium with a flat phase-function color.
    pub fn from_color(boundary: Arc<dyn Hittable>, density: f32, albedo: Color) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::from_color(albedo),
        }
    }
}

impl Hittable for ConstantMedium {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn RngCore,
    ) -> bool {
        // Entry anywhere along the ray, then the exit strictly after it
        let mut rec1 = HitRecord::default();
        if !self.boundary.hit(ray, Interval::UNIVERSE, &mut rec1, rng) {
            return false;
        }

        let mut rec2 = HitRecord::default();
        let after_entry = Interval::new(rec1.t + 1e-4, f32::INFINITY);
        if !self.boundary.hit(ray, after_entry, &mut rec2, rng) {
            return false;
        }

        // Clip the traversed span to the query interval
        if rec1.t < ray_t.min {
            rec1.t = ray_t.min;
        }
        if rec2.t > ray_t.max {
            rec2.t = ray_t.max;
        }

        if rec1.t >= rec2.t {
            return false;
        }

        if rec1.t < 0.0 {
            rec1.t = 0.0;
        }

        let ray_length = ray.direction().length();
        let distance_inside_boundary = (rec2.t - rec1.t) * ray_length;
        let hit_distance = self.neg_inv_density * gen_f32(rng).ln();

        // The ray leaves the boundary before scattering
        if hit_distance > distance_inside_boundary {
            return false;
        }

        rec.t = rec1.t + hit_distance / ray_length;
        rec.p = ray.at(rec.t);

        rec.normal = Vec3::X; // arbitrary
        rec.front_face = true; // also arbitrary
        rec.u = 0.0;
        rec.v = 0.0;
        rec.material = &self.phase_function;

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.boundary.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sphere;
    use crate::{Lambertian, Material};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn boundary() -> Arc<dyn Hittable> {
        let mat: Arc<dyn Material> = Arc::new(Lambertian::from_color(Vec3::ONE));
        Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0, mat))
    }

    #[test]
    fn test_dense_medium_scatters_inside() {
        // Density high enough that nearly every ray scatters in the volume
        let medium = ConstantMedium::from_color(boundary(), 1e4, Vec3::splat(0.5));
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);

        let mut rec = HitRecord::default();
        let hit = medium.hit(
            &ray,
            Interval::new(0.001, f32::INFINITY),
            &mut rec,
            &mut rng,
        );
        assert!(hit);
        // Scatter point lies within the boundary span [4, 6]
        assert!(rec.t >= 4.0 && rec.t <= 6.0);
        assert_eq!(rec.normal, Vec3::X);
        assert!(rec.front_face);
    }

    #[test]
    fn test_thin_medium_mostly_passes_through() {
        let medium = ConstantMedium::from_color(boundary(), 1e-4, Vec3::splat(0.5));
        let mut rng = StdRng::seed_from_u64(2);
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);

        let mut hits = 0;
        for _ in 0..100 {
            let mut rec = HitRecord::default();
            if medium.hit(
                &ray,
                Interval::new(0.001, f32::INFINITY),
                &mut rec,
                &mut rng,
            ) {
                hits += 1;
            }
        }
        assert!(hits < 10, "thin medium scattered {} of 100 rays", hits);
    }

    #[test]
    fn test_medium_misses_when_ray_misses_boundary() {
        let medium = ConstantMedium::from_color(boundary(), 10.0, Vec3::splat(0.5));
        let mut rng = StdRng::seed_from_u64(3);

        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Y);
        let mut rec = HitRecord::default();
        assert!(!medium.hit(
            &ray,
            Interval::new(0.001, f32::INFINITY),
            &mut rec,
            &mut rng
        ));
    }

    #[test]
    fn test_medium_respects_clipped_interval() {
        let medium = ConstantMedium::from_color(boundary(), 1e4, Vec3::splat(0.5));
        let mut rng = StdRng::seed_from_u64(4);
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Z);

        // The query interval ends before the boundary does
        let mut rec = HitRecord::default();
        if medium.hit(&ray, Interval::new(0.001, 4.5), &mut rec, &mut rng) {
            assert!(rec.t <= 4.5);
        }
    }

    #[test]
    fn test_medium_bbox_is_boundary_bbox() {
        let b = boundary();
        let medium = ConstantMedium::from_color(b.clone(), 1.0, Vec3::ONE);
        assert_eq!(medium.bounding_box(), b.bounding_box());
    }
}
