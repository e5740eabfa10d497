//! Initial simulation state
//!
//! A seed is a tightly packed RGBA8 pixel buffer, either decoded from an image file or
//! generated. Any decodable format is accepted; it is always expanded to four channels.

use std::path::Path;

use rand::Rng;

use crate::error::{AutomataError, Result};

/// Colour of a live cell in generated seeds
pub const ALIVE: [u8; 4] = [255, 255, 255, 255];
/// Colour of a dead cell in generated seeds
pub const DEAD: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, top row first
    pub pixels: Vec<u8>,
}

impl SeedImage {
    /// Wrap an existing RGBA8 buffer, checking its length against the dimensions
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(AutomataError::SeedDimensions {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an image file into four channels
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| AutomataError::SeedDecode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        let (width, height) = image.dimensions();
        log::info!("Loaded seed {} ({}x{})", path.display(), width, height);
        Self::from_rgba(width, height, image.into_raw())
    }

    /// Every pixel set to the same colour
    pub fn uniform(width: u32, height: u32, color: [u8; 4]) -> Result<Self> {
        let pixels = color.repeat(width as usize * height as usize);
        Self::from_rgba(width, height, pixels)
    }

    /// Random live/dead cells with the given live probability
    pub fn random_soup(width: u32, height: u32, density: f64) -> Result<Self> {
        let mut rng = rand::rng();
        let density = density.clamp(0.0, 1.0);
        let pixels = (0..width as usize * height as usize)
            .flat_map(|_| if rng.random_bool(density) { ALIVE } else { DEAD })
            .collect();

        log::info!(
            "Generated random seed {}x{} at density {:.2}",
            width,
            height,
            density
        );
        Self::from_rgba(width, height, pixels)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
