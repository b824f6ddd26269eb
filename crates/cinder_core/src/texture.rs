//! Texture model: sample a color at surface coordinates (u, v) and point p.

use std::sync::Arc;

use cinder_math::Vec3;
use rand::RngCore;

use crate::image::Image;
use crate::perlin::Perlin;

/// Debug color returned when an image texture has no backing data.
const MISSING_DATA_COLOR: Vec3 = Vec3::new(0.0, 1.0, 1.0);

/// Trait for textures that can be sampled at surface coordinates.
pub trait Texture: Send + Sync {
    /// Sample the texture color at (u, v) and world-space point p.
    fn value(&self, u: f32, v: f32, p: Vec3) -> Vec3;
}

/// A single flat color everywhere.
#[derive(Debug, Clone)]
pub struct SolidColor {
    albedo: Vec3,
}

impl SolidColor {
    pub fn new(albedo: Vec3) -> Self {
        Self { albedo }
    }

    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(Vec3::new(r, g, b))
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f32, _v: f32, _p: Vec3) -> Vec3 {
        self.albedo
    }
}

/// 3D checker pattern: grid-cell parity of the hit point selects between
/// two sub-textures.
pub struct CheckerTexture {
    inv_scale: f32,
    even: Arc<dyn Texture>,
    odd: Arc<dyn Texture>,
}

impl CheckerTexture {
    pub fn new(scale: f32, even: Arc<dyn Texture>, odd: Arc<dyn Texture>) -> Self {
        Self {
            inv_scale: 1.0 / scale,
            even,
            odd,
        }
    }

    pub fn from_colors(scale: f32, c1: Vec3, c2: Vec3) -> Self {
        Self::new(
            scale,
            Arc::new(SolidColor::new(c1)),
            Arc::new(SolidColor::new(c2)),
        )
    }
}

impl Texture for CheckerTexture {
    fn value(&self, u: f32, v: f32, p: Vec3) -> Vec3 {
        let x_int = (self.inv_scale * p.x).floor() as i64;
        let y_int = (self.inv_scale * p.y).floor() as i64;
        let z_int = (self.inv_scale * p.z).floor() as i64;

        let is_even = (x_int + y_int + z_int) % 2 == 0;
        if is_even {
            self.even.value(u, v, p)
        } else {
            self.odd.value(u, v, p)
        }
    }
}

/// Texture backed by a decoded image.
///
/// When the backing data failed to load, sampling returns a fixed debug
/// color instead of failing the render.
pub struct ImageTexture {
    image: Option<Arc<Image>>,
}

impl ImageTexture {
    /// Wrap an already-decoded image.
    pub fn new(image: Arc<Image>) -> Self {
        Self { image: Some(image) }
    }

    /// Load the backing file, degrading to the debug color on failure.
    pub fn load(path: &str) -> Self {
        let image = match Image::load(path) {
            Ok(img) => Some(Arc::new(img)),
            Err(why) => {
                log::warn!("Could not load image texture '{}': {}", path, why);
                None
            }
        };
        Self { image }
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f32, v: f32, _p: Vec3) -> Vec3 {
        match &self.image {
            Some(image) => image.sample(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)),
            None => MISSING_DATA_COLOR,
        }
    }
}

/// Marble-like procedural texture driven by Perlin turbulence.
pub struct NoiseTexture {
    noise: Perlin,
    scale: f32,
}

impl NoiseTexture {
    pub fn new(scale: f32, rng: &mut dyn RngCore) -> Self {
        Self {
            noise: Perlin::new(rng),
            scale,
        }
    }
}

impl Texture for NoiseTexture {
    fn value(&self, _u: f32, _v: f32, p: Vec3) -> Vec3 {
        let s = self.scale * p;
        Vec3::ONE * 0.5 * (1.0 - (s.z + 10.0 * self.noise.turb(s)).sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_solid_color() {
        let tex = SolidColor::from_rgb(0.3, 0.6, 0.9);
        assert_eq!(tex.value(0.0, 0.0, Vec3::ZERO), Vec3::new(0.3, 0.6, 0.9));
        // Position independent
        assert_eq!(
            tex.value(0.7, 0.2, Vec3::splat(100.0)),
            Vec3::new(0.3, 0.6, 0.9)
        );
    }

    #[test]
    fn test_checker_parity() {
        let black = Vec3::ZERO;
        let white = Vec3::ONE;
        let tex = CheckerTexture::from_colors(1.0, black, white);

        // Cell (0,0,0) is even, stepping one cell along x flips parity
        assert_eq!(tex.value(0.0, 0.0, Vec3::new(0.5, 0.5, 0.5)), black);
        assert_eq!(tex.value(0.0, 0.0, Vec3::new(1.5, 0.5, 0.5)), white);
        // Stepping along two axes flips twice
        assert_eq!(tex.value(0.0, 0.0, Vec3::new(1.5, 1.5, 0.5)), black);
    }

    #[test]
    fn test_image_texture_fallback() {
        let tex = ImageTexture::load("no/such/file.png");
        assert_eq!(tex.value(0.5, 0.5, Vec3::ZERO), MISSING_DATA_COLOR);
    }

    #[test]
    fn test_image_texture_samples_backing() {
        let image = Arc::new(Image::new(
            1,
            1,
            vec![[0.25, 0.5, 0.75, 1.0]],
            "<test>",
        ));
        let tex = ImageTexture::new(image);

        let c = tex.value(0.5, 0.5, Vec3::ZERO);
        assert!((c.x - 0.25).abs() < 1e-5);
        assert!((c.y - 0.5).abs() < 1e-5);
        assert!((c.z - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_noise_texture_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let tex = NoiseTexture::new(4.0, &mut rng);

        for i in 0..50 {
            let p = Vec3::new(i as f32 * 0.13, 0.0, i as f32 * 0.29);
            let c = tex.value(0.0, 0.0, p);
            // 0.5 * (1 - sin(..)) stays within [0, 1]
            assert!(c.x >= 0.0 && c.x <= 1.0);
        }
    }
}
