//! Shared RGBA frame buffer written concurrently by pixel tasks.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use thiserror::Error;

/// Errors raised while creating the frame buffer.
#[derive(Error, Debug)]
pub enum FrameBufferError {
    #[error("Failed to allocate {width}x{height} frame buffer: {source}")]
    Allocation {
        width: u32,
        height: u32,
        source: std::collections::TryReserveError,
    },
}

/// A fixed-size 2D array of 4-channel 8-bit pixels.
///
/// Pixels are packed into one atomic word each, row-major and top to
/// bottom. Every render task owns a distinct pixel index, so concurrent
/// writes never land on the same word; a consumer reading mid-render sees
/// a torn frame, which the live-preview contract accepts.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<AtomicU32>,
}

impl FrameBuffer {
    /// Allocate a zeroed frame buffer.
    ///
    /// Allocation failure is the one fatal condition of the render path
    /// and is surfaced here, before any rendering starts.
    pub fn new(width: u32, height: u32) -> Result<Self, FrameBufferError> {
        let len = width as usize * height as usize;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|source| FrameBufferError::Allocation {
                width,
                height,
                source,
            })?;
        pixels.extend((0..len).map(|_| AtomicU32::new(0)));

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Store one pixel. Each render task writes only its own index.
    #[inline]
    pub fn store(&self, x: u32, y: u32, rgba: [u8; 4]) {
        self.pixels[self.index(x, y)].store(u32::from_le_bytes(rgba), Ordering::Relaxed);
    }

    /// Read one pixel (possibly mid-render).
    #[inline]
    pub fn pixel_at(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[self.index(x, y)].load(Ordering::Relaxed).to_le_bytes()
    }

    /// Reset every pixel to transparent black.
    ///
    /// Whole-frame operations must be serialized against an in-flight
    /// render by the driver (cancel, then join) before calling this.
    pub fn clear(&self) {
        log::info!("Clearing frame buffer");
        for pixel in &self.pixels {
            pixel.store(0, Ordering::Relaxed);
        }
    }

    /// Fill every pixel with one color.
    pub fn fill(&self, rgba: [u8; 4]) {
        log::info!(
            "Filling frame buffer with ({}, {}, {}, {})",
            rgba[0],
            rgba[1],
            rgba[2],
            rgba[3]
        );
        let word = u32::from_le_bytes(rgba);
        for pixel in &self.pixels {
            pixel.store(word, Ordering::Relaxed);
        }
    }

    /// Snapshot the buffer as packed RGBA bytes (row-major, top to bottom).
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            bytes.extend_from_slice(&pixel.load(Ordering::Relaxed).to_le_bytes());
        }
        bytes
    }

    /// Write the buffer to a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let path = path.as_ref();
        log::info!("Writing frame buffer to file: {}", path.display());

        let start = Instant::now();
        image::save_buffer(
            path,
            &self.to_rgba_bytes(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )?;
        log::info!("Write to file complete. Took {:?}", start.elapsed());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_read_back() {
        let frame = FrameBuffer::new(4, 3).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);

        frame.store(2, 1, [10, 20, 30, 255]);
        assert_eq!(frame.pixel_at(2, 1), [10, 20, 30, 255]);
        // Neighbors untouched
        assert_eq!(frame.pixel_at(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_clear_and_fill() {
        let frame = FrameBuffer::new(2, 2).unwrap();
        frame.fill([5, 6, 7, 8]);
        assert_eq!(frame.pixel_at(0, 0), [5, 6, 7, 8]);
        assert_eq!(frame.pixel_at(1, 1), [5, 6, 7, 8]);

        frame.clear();
        assert_eq!(frame.pixel_at(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_rgba_bytes_layout() {
        let frame = FrameBuffer::new(2, 1).unwrap();
        frame.store(0, 0, [1, 2, 3, 4]);
        frame.store(1, 0, [5, 6, 7, 8]);

        assert_eq!(frame.to_rgba_bytes(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_concurrent_writers_disjoint_pixels() {
        use std::sync::Arc;

        let frame = Arc::new(FrameBuffer::new(64, 64).unwrap());
        let mut handles = Vec::new();
        for t in 0..4u32 {
            let frame = Arc::clone(&frame);
            handles.push(std::thread::spawn(move || {
                for y in 0..64 {
                    for x in (t..64).step_by(4) {
                        frame.store(x, y, [t as u8 + 1, 0, 0, 255]);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for y in 0..64 {
            for x in 0..64u32 {
                let expected = (x % 4) as u8 + 1;
                assert_eq!(frame.pixel_at(x, y)[0], expected);
            }
        }
    }
}
