//! Image loading and caching for textures.
//!
//! Decodes image files into linear float RGBA pixels suitable for
//! sampling during rendering.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinder_math::Vec3;
use thiserror::Error;

/// Errors that can occur while loading image assets.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to load image: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Decode(#[from] image::ImageError),
}

pub type ImageResult<T> = Result<T, ImageError>;

/// A decoded image with pixel data.
///
/// Stores pixels in linear RGBA float format, row-major order.
#[derive(Clone, Debug)]
pub struct Image {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Pixel data as [R, G, B, A] per pixel (linear, 0-1 range)
    pub pixels: Vec<[f32; 4]>,

    /// Original file path (for diagnostics)
    pub path: String,
}

impl Image {
    /// Create a new image from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Load and decode an image file.
    pub fn load(path: impl AsRef<Path>) -> ImageResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| {
            ImageError::LoadError(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<[f32; 4]> = rgba
            .pixels()
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0, // Alpha is linear
                ]
            })
            .collect();

        log::debug!("Loaded image: {} ({}x{})", path.display(), width, height);

        Ok(Self::new(
            width,
            height,
            pixels,
            path.to_string_lossy().to_string(),
        ))
    }

    /// Sample the image at UV coordinates (bilinear filtering).
    ///
    /// UV coordinates are in [0, 1] range, with (0, 0) at bottom-left.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        // Wrap UV coordinates
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        // Convert to pixel coordinates
        let x = u * (self.width as f32 - 1.0);
        let y = (1.0 - v) * (self.height as f32 - 1.0); // Flip V for image coordinates

        // Bilinear interpolation
        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let p00 = self.get_pixel(x0, y0);
        let p10 = self.get_pixel(x1, y0);
        let p01 = self.get_pixel(x0, y1);
        let p11 = self.get_pixel(x1, y1);

        let top = Vec3::new(
            p00[0] * (1.0 - fx) + p10[0] * fx,
            p00[1] * (1.0 - fx) + p10[1] * fx,
            p00[2] * (1.0 - fx) + p10[2] * fx,
        );
        let bottom = Vec3::new(
            p01[0] * (1.0 - fx) + p11[0] * fx,
            p01[1] * (1.0 - fx) + p11[1] * fx,
            p01[2] * (1.0 - fx) + p11[2] * fx,
        );

        top * (1.0 - fy) + bottom * fy
    }

    /// Get pixel at integer coordinates.
    fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .copied()
            .unwrap_or([0.0, 0.0, 0.0, 1.0])
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}

/// Cache for loaded images.
///
/// Images are loaded on-demand and shared between textures.
pub struct ImageCache {
    /// Cached images by file path
    images: HashMap<String, Arc<Image>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl ImageCache {
    /// Create a new empty image cache.
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create an image cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            images: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load an image from file, using the cache if available.
    pub fn load(&mut self, path: &str) -> ImageResult<Arc<Image>> {
        if let Some(img) = self.images.get(path) {
            return Ok(img.clone());
        }

        let full_path = self.resolve_path(path);
        let img = Arc::new(Image::load(&full_path)?);

        self.images.insert(path.to_string(), img.clone());

        log::debug!(
            "Cached image: {} ({:.1} KB)",
            path,
            img.size_bytes() as f32 / 1024.0
        );

        Ok(img)
    }

    /// Get a cached image without loading.
    pub fn get(&self, path: &str) -> Option<Arc<Image>> {
        self.images.get(path).cloned()
    }

    /// Get the number of cached images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Clear all cached images.
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_sample() {
        // 2x1 image: black then white
        let img = Image::new(
            2,
            1,
            vec![[0.0, 0.0, 0.0, 1.0], [1.0, 1.0, 1.0, 1.0]],
            "<test>",
        );

        let left = img.sample(0.0, 0.5);
        let right = img.sample(0.99, 0.5);
        assert!(left.x < 0.1);
        assert!(right.x > 0.9);
    }

    #[test]
    fn test_image_cache_miss() {
        let cache = ImageCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("nope.png").is_none());
    }

    #[test]
    fn test_load_missing_file_is_err() {
        assert!(Image::load("definitely/not/here.png").is_err());
    }

    #[test]
    fn test_srgb_to_linear() {
        // Black stays black
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);

        // White stays white
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
