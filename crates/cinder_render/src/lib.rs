//! Cinder - CPU Monte Carlo path tracing.
//!
//! The engine core: hittable surfaces, BVH acceleration, material
//! scattering, camera ray generation, and a cancellable parallel
//! per-pixel scheduler writing into a shared frame buffer.

mod bvh;
mod camera;
mod framebuffer;
mod hittable;
mod material;
mod quad;
mod renderer;
pub mod rng;
pub mod scenes;
mod sphere;
mod transform;
mod volume;

pub use bvh::BvhNode;
pub use camera::{Background, Camera, RenderSettings, SettingsError};
pub use framebuffer::{FrameBuffer, FrameBufferError};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{
    Color, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal, ScatterResult,
};
pub use quad::{cuboid, Quad};
pub use renderer::{color_to_rgba, linear_to_gamma, ray_color, render_pixel, Renderer};
pub use sphere::Sphere;
pub use transform::{RotateY, Translate};
pub use volume::ConstantMedium;

/// Re-export the math and texture layers for downstream convenience.
pub use cinder_core::{CheckerTexture, ImageTexture, NoiseTexture, SolidColor, Texture};
pub use cinder_math::{Aabb, Interval, Ray, Vec3};
