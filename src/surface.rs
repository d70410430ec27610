// SPDX-License-Identifier: GPL-3.0-only

//! Owned RGBA pixel surface
//!
//! The `PixelSurface` is the only entity user code and the filters operate
//! on after decode. It owns its samples; hardware buffers never leak past
//! the decoder.

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;

/// A single RGBA sample, 8 bits per channel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Owned, mutable 2D buffer of RGBA samples with explicit dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl PixelSurface {
    /// Create a zero-filled surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::default(); (width as usize) * (height as usize)],
        }
    }

    /// Create a surface from an existing pixel buffer.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
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

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba) {
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)] = pixel;
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// View the surface as raw RGBA bytes (row-major, no padding)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Build a surface from a decoded RGBA image
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let raw = image.into_raw();
        let pixels = bytemuck::cast_slice::<u8, Rgba>(&raw).to_vec();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an `image` crate RGBA image for encoding
    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length matches dimensions by construction
        RgbaImage::from_raw(self.width, self.height, self.as_bytes().to_vec())
            .expect("pixel buffer length matches dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixels_rejects_length_mismatch() {
        assert!(PixelSurface::from_pixels(2, 2, vec![Rgba::default(); 3]).is_none());
        assert!(PixelSurface::from_pixels(2, 2, vec![Rgba::default(); 4]).is_some());
    }

    #[test]
    fn test_pixel_roundtrip() {
        let mut surface = PixelSurface::new(3, 2);
        surface.set_pixel(2, 1, Rgba::new(10, 20, 30, 255));
        assert_eq!(surface.pixel(2, 1), Rgba::new(10, 20, 30, 255));
        assert_eq!(surface.pixel(0, 0), Rgba::default());
    }

    #[test]
    fn test_image_roundtrip() {
        let mut surface = PixelSurface::new(2, 2);
        surface.set_pixel(0, 0, Rgba::new(1, 2, 3, 4));
        surface.set_pixel(1, 1, Rgba::new(200, 100, 50, 255));

        let image = surface.to_rgba_image();
        let back = PixelSurface::from_rgba_image(image);
        assert_eq!(back, surface);
    }
}
