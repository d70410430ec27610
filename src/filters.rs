// SPDX-License-Identifier: GPL-3.0-only

//! Post-capture color transforms
//!
//! Pure per-pixel transforms over a decoded `PixelSurface`. Every call
//! allocates a new surface and never mutates its input, so callers can keep
//! the original capture around and re-apply a different transform at will.
//!
//! Note that only `None` is idempotent: re-applying `Grayscale` or
//! `SepiaTint` composes over the already-transformed surface. Callers that
//! want "reselect filter" semantics must re-apply to the original capture
//! themselves.

use crate::constants::{LUMA_B, LUMA_G, LUMA_R, SEPIA_SCALE};
use crate::surface::{PixelSurface, Rgba};
use serde::{Deserialize, Serialize};

/// Selector for the post-capture color transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformKind {
    /// Pass-through; the only idempotent transform
    #[default]
    None,
    /// Luminance-weighted desaturation (BT.601 weights)
    Grayscale,
    /// Per-channel linear scale R×1.0, G×0.8, B×0.5
    SepiaTint,
    /// Per-channel inversion `255 − v`; its own inverse
    Invert,
}

impl TransformKind {
    /// All transform kinds, for UI iteration
    pub const ALL: [TransformKind; 4] = [
        TransformKind::None,
        TransformKind::Grayscale,
        TransformKind::SepiaTint,
        TransformKind::Invert,
    ];

    /// Display name for the transform
    pub fn display_name(&self) -> &'static str {
        match self {
            TransformKind::None => "None",
            TransformKind::Grayscale => "Grayscale",
            TransformKind::SepiaTint => "Sepia",
            TransformKind::Invert => "Invert",
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Apply a color transform, producing a new surface.
///
/// Alpha is preserved by every transform and all channel arithmetic is
/// clamped to `0..=255`. `None` returns a surface observationally equal to
/// the input.
pub fn apply(surface: &PixelSurface, kind: TransformKind) -> PixelSurface {
    match kind {
        TransformKind::None => surface.clone(),
        TransformKind::Grayscale => map_pixels(surface, grayscale_pixel),
        TransformKind::SepiaTint => map_pixels(surface, sepia_pixel),
        TransformKind::Invert => map_pixels(surface, invert_pixel),
    }
}

fn map_pixels(surface: &PixelSurface, f: impl Fn(Rgba) -> Rgba) -> PixelSurface {
    let pixels = surface.pixels().iter().copied().map(f).collect();
    PixelSurface::from_pixels(surface.width(), surface.height(), pixels)
        .expect("mapped buffer keeps source dimensions")
}

fn grayscale_pixel(p: Rgba) -> Rgba {
    let luma = LUMA_R * f32::from(p.r) + LUMA_G * f32::from(p.g) + LUMA_B * f32::from(p.b);
    let v = clamp_channel(luma);
    Rgba::new(v, v, v, p.a)
}

fn sepia_pixel(p: Rgba) -> Rgba {
    Rgba::new(
        clamp_channel(f32::from(p.r) * SEPIA_SCALE[0]),
        clamp_channel(f32::from(p.g) * SEPIA_SCALE[1]),
        clamp_channel(f32::from(p.b) * SEPIA_SCALE[2]),
        p.a,
    )
}

fn invert_pixel(p: Rgba) -> Rgba {
    Rgba::new(255 - p.r, 255 - p.g, 255 - p.b, p.a)
}

fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pixel(p: Rgba) -> PixelSurface {
        PixelSurface::from_pixels(1, 1, vec![p]).unwrap()
    }

    #[test]
    fn test_none_is_observationally_equal() {
        let surface = single_pixel(Rgba::new(12, 34, 56, 78));
        assert_eq!(apply(&surface, TransformKind::None), surface);
    }

    #[test]
    fn test_grayscale_of_pure_red() {
        // luma(255, 0, 0) = 0.299 * 255 = 76.245, rounded to 76
        let surface = single_pixel(Rgba::new(255, 0, 0, 255));
        let result = apply(&surface, TransformKind::Grayscale);
        assert_eq!(result.pixel(0, 0), Rgba::new(76, 76, 76, 255));
    }

    #[test]
    fn test_sepia_scales_channels() {
        let surface = single_pixel(Rgba::new(100, 100, 100, 200));
        let result = apply(&surface, TransformKind::SepiaTint);
        assert_eq!(result.pixel(0, 0), Rgba::new(100, 80, 50, 200));
    }

    #[test]
    fn test_invert_pixel_values() {
        let surface = single_pixel(Rgba::new(10, 20, 30, 255));
        let result = apply(&surface, TransformKind::Invert);
        assert_eq!(result.pixel(0, 0), Rgba::new(245, 235, 225, 255));
    }

    #[test]
    fn test_invert_is_involution() {
        let surface = single_pixel(Rgba::new(17, 93, 211, 128));
        let twice = apply(&apply(&surface, TransformKind::Invert), TransformKind::Invert);
        assert_eq!(twice, surface);
    }

    #[test]
    fn test_grayscale_is_not_an_involution() {
        // Applying twice does not restore the colored input
        let surface = single_pixel(Rgba::new(200, 30, 90, 255));
        let twice = apply(
            &apply(&surface, TransformKind::Grayscale),
            TransformKind::Grayscale,
        );
        assert_ne!(twice, surface);
    }

    #[test]
    fn test_sepia_compounds_when_reapplied() {
        let surface = single_pixel(Rgba::new(100, 100, 100, 255));
        let once = apply(&surface, TransformKind::SepiaTint);
        let twice = apply(&once, TransformKind::SepiaTint);
        assert_ne!(twice, once);
        assert_eq!(twice.pixel(0, 0), Rgba::new(100, 64, 25, 255));
    }
}
