//! Cinder Core - textures and image assets for the path tracer.
//!
//! This crate provides:
//!
//! - **Texture model**: the `Texture` trait and its variants (solid,
//!   checker, image-backed, procedural noise)
//! - **Image assets**: decoded pixel storage with bilinear sampling and
//!   an on-demand cache
//! - **Perlin noise**: the lattice noise field behind `NoiseTexture`

pub mod image;
pub mod perlin;
pub mod texture;

pub use crate::image::{Image, ImageCache, ImageError};
pub use perlin::Perlin;
pub use texture::{CheckerTexture, ImageTexture, NoiseTexture, SolidColor, Texture};
