//! Material scattering model.

use std::sync::Arc;

use cinder_core::{SolidColor, Texture};
use cinder_math::{Ray, Vec3};
use rand::RngCore;

use crate::hittable::HitRecord;
use crate::rng::{gen_f32, random_unit_vector};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Outcome of a successful scatter.
pub struct ScatterResult {
    /// Color filter applied to the scattered ray's radiance
    pub attenuation: Color,
    /// The outgoing ray
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns the attenuation and outgoing ray, or None if the ray is
    /// absorbed.
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult>;

    /// Get emitted light from this material.
    ///
    /// Most materials emit nothing.
    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        Color::ZERO
    }
}

/// Lambertian (diffuse) material with a texture-backed albedo.
pub struct Lambertian {
    albedo: Arc<dyn Texture>,
}

impl Lambertian {
    /// Create a Lambertian material over an albedo texture.
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }

    /// Create a Lambertian material with a flat albedo color.
    pub fn from_color(albedo: Color) -> Self {
        Self::new(Arc::new(SolidColor::new(albedo)))
    }
}

impl Material for Lambertian {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        // Scatter in a random direction on the hemisphere around the normal
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo.value(rec.u, rec.v, rec.p),
            scattered: Ray::new(rec.p, scatter_direction, ray_in.time()),
        })
    }
}

/// Metal (specular) material.
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let scattered_dir = reflected + self.fuzz * random_unit_vector(rng);

        // Only scatter if the perturbed ray leaves the surface
        if scattered_dir.dot(rec.normal) > 0.0 {
            Some(ScatterResult {
                attenuation: self.albedo,
                scattered: Ray::new(rec.p, scattered_dir, ray_in.time()),
            })
        } else {
            None
        }
    }
}

/// Dielectric (glass) material.
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, ior: f32) -> f32 {
        let r0 = ((1.0 - ior) / (1.0 + ior)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        let refraction_ratio = if rec.front_face {
            1.0 / self.ior
        } else {
            self.ior
        };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Snell's law has no real solution: total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction =
            if cannot_refract || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng) {
                reflect(unit_direction, rec.normal)
            } else {
                refract(unit_direction, rec.normal, refraction_ratio)
            };

        Some(ScatterResult {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction, ray_in.time()),
        })
    }
}

/// Diffuse light emitter.
pub struct DiffuseLight {
    emit: Arc<dyn Texture>,
}

impl DiffuseLight {
    /// Create a diffuse light over an emission texture.
    pub fn new(emit: Arc<dyn Texture>) -> Self {
        Self { emit }
    }

    /// Create a diffuse light with a flat emission color.
    pub fn from_color(emit: Color) -> Self {
        Self::new(Arc::new(SolidColor::new(emit)))
    }
}

impl Material for DiffuseLight {
    fn scatter(
        &self,
        _ray_in: &Ray,
        _rec: &HitRecord,
        _rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        // Lights don't scatter rays
        None
    }

    fn emitted(&self, u: f32, v: f32, p: Vec3) -> Color {
        self.emit.value(u, v, p)
    }
}

/// Isotropic phase function for participating media.
///
/// Scatters uniformly in all directions; surface orientation is ignored.
pub struct Isotropic {
    albedo: Arc<dyn Texture>,
}

impl Isotropic {
    pub fn new(albedo: Arc<dyn Texture>) -> Self {
        Self { albedo }
    }

    pub fn from_color(albedo: Color) -> Self {
        Self::new(Arc::new(SolidColor::new(albedo)))
    }
}

impl Material for Isotropic {
    fn scatter(
        &self,
        ray_in: &Ray,
        rec: &HitRecord,
        rng: &mut dyn RngCore,
    ) -> Option<ScatterResult> {
        Some(ScatterResult {
            attenuation: self.albedo.value(rec.u, rec.v, rec.p),
            scattered: Ray::new(rec.p, random_unit_vector(rng), ray_in.time()),
        })
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a vector through a surface.
#[inline]
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn front_face_record<'a>(material: &'a dyn Material) -> HitRecord<'a> {
        HitRecord {
            p: Vec3::ZERO,
            normal: Vec3::Y,
            material,
            u: 0.0,
            v: 0.0,
            t: 1.0,
            front_face: true,
        }
    }

    #[test]
    fn test_lambertian_scatters_off_normal() {
        let mat = Lambertian::from_color(Color::new(0.8, 0.4, 0.2));
        let rec = front_face_record(&mat);
        let ray = Ray::new_simple(Vec3::new(0.0, 1.0, -1.0), Vec3::new(0.0, -1.0, 1.0));
        let mut rng = StdRng::seed_from_u64(5);

        let result = mat.scatter(&ray, &rec, &mut rng).unwrap();
        assert_eq!(result.attenuation, Color::new(0.8, 0.4, 0.2));
        // Scatter direction stays in the normal's hemisphere
        assert!(result.scattered.direction().dot(rec.normal) > 0.0);
    }

    #[test]
    fn test_metal_absorbs_grazing_fuzz() {
        // Maximum fuzz with a grazing incoming ray will sometimes push the
        // scattered ray below the surface; those samples are absorbed.
        let mat = Metal::new(Color::ONE, 1.0);
        let rec = front_face_record(&mat);
        let ray = Ray::new_simple(Vec3::new(-1.0, 0.001, 0.0), Vec3::new(1.0, -0.001, 0.0));
        let mut rng = StdRng::seed_from_u64(6);

        let mut absorbed = 0;
        for _ in 0..200 {
            if mat.scatter(&ray, &rec, &mut rng).is_none() {
                absorbed += 1;
            }
        }
        assert!(absorbed > 0);
    }

    #[test]
    fn test_metal_mirror_reflects_exactly() {
        let mat = Metal::new(Color::ONE, 0.0);
        let rec = front_face_record(&mat);
        // 45 degree incidence in the xy plane
        let ray = Ray::new_simple(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(7);

        let result = mat.scatter(&ray, &rec, &mut rng).unwrap();
        let dir = result.scattered.direction().normalize();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((dir - expected).length() < 1e-5);
    }

    #[test]
    fn test_dielectric_always_scatters() {
        let mat = Dielectric::new(1.5);
        let rec = front_face_record(&mat);
        let mut rng = StdRng::seed_from_u64(8);

        for i in 0..100 {
            // Sweep incidence angles, including grazing ones
            let angle = 0.01 + (i as f32 / 100.0) * 1.5;
            let dir = Vec3::new(angle.sin(), -angle.cos(), 0.0);
            let ray = Ray::new_simple(Vec3::new(0.0, 1.0, 0.0), dir);

            let result = mat.scatter(&ray, &rec, &mut rng);
            assert!(result.is_some(), "dielectric refused to scatter");
            let result = result.unwrap();
            assert_eq!(result.attenuation, Color::ONE);
            // Reflection and refraction of a unit direction stay unit length
            assert!((result.scattered.direction().length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_diffuse_light_emits_and_absorbs() {
        let mat = DiffuseLight::from_color(Color::new(4.0, 4.0, 4.0));
        let rec = front_face_record(&mat);
        let ray = Ray::new_simple(Vec3::ZERO, -Vec3::Y);
        let mut rng = StdRng::seed_from_u64(9);

        assert!(mat.scatter(&ray, &rec, &mut rng).is_none());
        assert_eq!(mat.emitted(0.5, 0.5, Vec3::ZERO), Color::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn test_isotropic_scatters_any_direction() {
        let mat = Isotropic::from_color(Color::splat(0.7));
        let rec = front_face_record(&mat);
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::X);
        let mut rng = StdRng::seed_from_u64(10);

        // Over many samples, some scatter into the back hemisphere
        let mut backward = 0;
        for _ in 0..200 {
            let result = mat.scatter(&ray, &rec, &mut rng).unwrap();
            if result.scattered.direction().dot(rec.normal) < 0.0 {
                backward += 1;
            }
        }
        assert!(backward > 0);
    }
}
