//! Path-tracing estimator and the concurrent pixel scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use cinder_math::{Interval, Ray};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::camera::{Background, Camera};
use crate::framebuffer::FrameBuffer;
use crate::hittable::{HitRecord, Hittable};
use crate::material::Color;

/// Lower ray-parameter bound, avoiding self-intersection at the origin.
const RAY_EPSILON: f32 = 0.001;

/// Mixing constant for per-pixel generator seeds (splitmix64 gamma).
const SEED_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Compute the radiance carried by a ray.
///
/// Recursive Monte Carlo estimate: emission at the hit plus the
/// attenuated radiance of the scattered ray, down to a hard depth cap.
/// Side-effect free; all randomness comes from the supplied generator.
pub fn ray_color(
    ray: &Ray,
    world: &dyn Hittable,
    depth: u32,
    background: &Background,
    rng: &mut dyn RngCore,
) -> Color {
    // Depth cap substitutes for Russian-roulette termination
    if depth == 0 {
        return Color::ZERO;
    }

    let mut rec = HitRecord::default();

    if !world.hit(
        ray,
        Interval::new(RAY_EPSILON, f32::INFINITY),
        &mut rec,
        rng,
    ) {
        return match background {
            Background::SkyGradient => sky_gradient(ray),
            Background::Solid(color) => *color,
        };
    }

    let emission = rec.material.emitted(rec.u, rec.v, rec.p);

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => {
            let scattered_color = ray_color(&result.scattered, world, depth - 1, background, rng);
            emission + result.attenuation * scattered_color
        }
        None => emission,
    }
}

/// Vertical white-to-blue gradient along the ray direction.
fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA (straight alpha).
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Render a single pixel: average the radiance of jittered samples.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    x: u32,
    y: u32,
    rng: &mut dyn RngCore,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel {
        let ray = camera.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, world, camera.max_depth, &camera.background, rng);
    }

    pixel_color / camera.samples_per_pixel as f32
}

/// Cancellable parallel renderer.
///
/// Drives one full image render as one task per pixel on a caller-supplied
/// thread pool, writing into a shared frame buffer that a consumer may
/// read at any time for live preview.
pub struct Renderer {
    stopped: AtomicBool,
    done: AtomicBool,
    rendering: AtomicBool,
    seed: u64,
}

impl Renderer {
    /// Create a renderer with the default seed.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a renderer with a fixed seed.
    ///
    /// The same seed, scene, and camera produce an identical frame buffer
    /// regardless of thread count or scheduling.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            stopped: AtomicBool::new(false),
            done: AtomicBool::new(false),
            rendering: AtomicBool::new(false),
            seed,
        }
    }

    /// Request cancellation of an in-flight render.
    ///
    /// Cooperative: tasks check the flag when they start, so a task
    /// already past its check runs to completion. A cancelled render
    /// never reports `complete()`.
    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// True while `render` is executing.
    pub fn rendering(&self) -> bool {
        self.rendering.load(Ordering::Relaxed)
    }

    /// True once a render has finished without cancellation.
    pub fn complete(&self) -> bool {
        self.done.load(Ordering::Relaxed)
    }

    /// Render the scene into the frame buffer.
    ///
    /// Blocks until every pixel task has finished or bailed out on
    /// cancellation. Each task owns one pixel index, so no two tasks
    /// write the same memory location.
    pub fn render(
        &self,
        camera: &Camera,
        world: &dyn Hittable,
        pool: &rayon::ThreadPool,
        frame: &FrameBuffer,
    ) {
        self.stopped.store(false, Ordering::Relaxed);
        self.done.store(false, Ordering::Relaxed);
        self.rendering.store(true, Ordering::Relaxed);

        let (width, height) = camera.image_dimensions();
        debug_assert_eq!((width, height), (frame.width(), frame.height()));

        log::info!(
            "Rendering {}x{} at {} spp, depth {}, {} threads",
            width,
            height,
            camera.samples_per_pixel,
            camera.max_depth,
            pool.current_num_threads()
        );
        let start = Instant::now();

        // One unit of work per pixel. The pool has no priority classes,
        // so a seeded shuffle stands in for random task priorities: the
        // preview fills in evenly instead of top to bottom.
        let mut order: Vec<u32> = (0..width * height).collect();
        order.shuffle(&mut SmallRng::seed_from_u64(self.seed));

        pool.install(|| {
            order.par_iter().for_each(|&index| {
                if self.stopped.load(Ordering::Relaxed) {
                    return;
                }

                let x = index % width;
                let y = index / width;

                // Per-task generator: seeded from the pixel index so the
                // result is schedule-independent
                let mut rng = SmallRng::seed_from_u64(
                    self.seed ^ (index as u64 + 1).wrapping_mul(SEED_GAMMA),
                );

                let color = render_pixel(camera, world, x, y, &mut rng);
                frame.store(x, y, color_to_rgba(color));
            });
        });

        if self.stopped.load(Ordering::Relaxed) {
            log::info!("Render cancelled after {:?}", start.elapsed());
        } else {
            self.done.store(true, Ordering::Relaxed);
            log::info!("Render complete in {:?}", start.elapsed());
        }
        self.rendering.store(false, Ordering::Relaxed);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
