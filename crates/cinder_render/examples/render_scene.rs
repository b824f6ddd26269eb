//! Render a demo scene to a PNG file.
//!
//! Usage: render_scene [settings.json]
//!
//! With no argument the built-in random-spheres preset is used. Logging
//! follows RUST_LOG (e.g. RUST_LOG=debug).

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cinder_render::{scenes, BvhNode, Camera, FrameBuffer, RenderSettings, Renderer, Vec3};

fn main() -> Result<()> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => RenderSettings::load(&path)?,
        None => RenderSettings {
            image_width: 800,
            samples_per_pixel: 50,
            max_depth: 20,
            vfov: 20.0,
            look_from: Vec3::new(13.0, 2.0, 3.0),
            look_at: Vec3::ZERO,
            vup: Vec3::Y,
            defocus_angle: 0.6,
            focus_dist: 10.0,
            ..Default::default()
        },
    };

    let mut camera = Camera::from_settings(&settings);
    camera.initialize();

    let start = std::time::Instant::now();
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let world = BvhNode::from_list(&scenes::random_spheres(&mut rng));
    log::info!("Scene built in {:?}", start.elapsed());

    let (width, height) = camera.image_dimensions();
    let frame = FrameBuffer::new(width, height)?;
    let pool = rayon::ThreadPoolBuilder::new().build()?;

    let renderer = Renderer::with_seed(settings.seed);
    renderer.render(&camera, &world, &pool, &frame);

    frame.save_png("render.png")?;

    Ok(())
}
