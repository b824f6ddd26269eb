//! Demo scene builders exercising the primitive and material library.

use std::sync::Arc;

use cinder_core::{CheckerTexture, NoiseTexture};
use cinder_math::Vec3;
use rand::{Rng, RngCore};

use crate::hittable::HittableList;
use crate::material::{Color, Dielectric, DiffuseLight, Lambertian, Material, Metal};
use crate::quad::{cuboid, Quad};
use crate::sphere::Sphere;
use crate::transform::{RotateY, Translate};
use crate::volume::ConstantMedium;

/// The classic showcase: a checkered ground plane covered in small random
/// spheres (some moving), with three large feature spheres.
pub fn random_spheres(rng: &mut dyn RngCore) -> HittableList {
    let mut world = HittableList::new();

    let checker = CheckerTexture::from_colors(
        0.32,
        Color::new(0.2, 0.3, 0.1),
        Color::new(0.9, 0.9, 0.9),
    );
    let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Arc::new(checker)));
    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        ground,
    )));

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat: f32 = rng.gen();
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            if choose_mat < 0.8 {
                // Diffuse, drifting upwards over the shutter interval
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                let material: Arc<dyn Material> = Arc::new(Lambertian::from_color(albedo));
                let center2 = center + Vec3::new(0.0, 0.5 * rng.gen::<f32>(), 0.0);
                world.add(Arc::new(Sphere::new_moving(center, center2, 0.2, material)));
            } else if choose_mat < 0.95 {
                // Metal
                let albedo = Color::new(
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                );
                let fuzz = 0.5 * rng.gen::<f32>();
                let material: Arc<dyn Material> = Arc::new(Metal::new(albedo, fuzz));
                world.add(Arc::new(Sphere::new(center, 0.2, material)));
            } else {
                // Glass
                let material: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));
                world.add(Arc::new(Sphere::new(center, 0.2, material)));
            }
        }
    }

    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));
    world.add(Arc::new(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, glass)));

    let marble: Arc<dyn Material> =
        Arc::new(Lambertian::new(Arc::new(NoiseTexture::new(4.0, rng))));
    world.add(Arc::new(Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0, marble)));

    let metal: Arc<dyn Material> = Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0));
    world.add(Arc::new(Sphere::new(Vec3::new(4.0, 1.0, 0.0), 1.0, metal)));

    world
}

/// Cornell box with two rotated boxes rendered as smoke volumes.
pub fn cornell_smoke() -> HittableList {
    let mut world = HittableList::new();

    let red: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::new(0.65, 0.05, 0.05)));
    let white: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::new(0.73, 0.73, 0.73)));
    let green: Arc<dyn Material> = Arc::new(Lambertian::from_color(Color::new(0.12, 0.45, 0.15)));
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::from_color(Color::new(7.0, 7.0, 7.0)));

    // Walls
    world.add(Arc::new(Quad::new(
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        green,
    )));
    world.add(Arc::new(Quad::new(
        Vec3::ZERO,
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        red,
    )));
    world.add(Arc::new(Quad::new(
        Vec3::new(113.0, 554.0, 127.0),
        Vec3::new(330.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 305.0),
        light,
    )));
    world.add(Arc::new(Quad::new(
        Vec3::ZERO,
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        white.clone(),
    )));
    world.add(Arc::new(Quad::new(
        Vec3::new(555.0, 555.0, 555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        white.clone(),
    )));
    world.add(Arc::new(Quad::new(
        Vec3::new(0.0, 0.0, 555.0),
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        white.clone(),
    )));

    // Two boxes, rotated and translated into place, filled with smoke
    let box1 = Arc::new(cuboid(
        Vec3::ZERO,
        Vec3::new(165.0, 330.0, 165.0),
        white.clone(),
    ));
    let box1 = Arc::new(RotateY::new(box1, 15.0));
    let box1 = Arc::new(Translate::new(box1, Vec3::new(265.0, 0.0, 295.0)));
    world.add(Arc::new(ConstantMedium::from_color(
        box1,
        0.01,
        Color::ZERO,
    )));

    let box2 = Arc::new(cuboid(Vec3::ZERO, Vec3::new(165.0, 165.0, 165.0), white));
    let box2 = Arc::new(RotateY::new(box2, -18.0));
    let box2 = Arc::new(Translate::new(box2, Vec3::new(130.0, 0.0, 65.0)));
    world.add(Arc::new(ConstantMedium::from_color(box2, 0.01, Color::ONE)));

    world
}
