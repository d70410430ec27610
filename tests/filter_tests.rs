// SPDX-License-Identifier: GPL-3.0-only

//! Property checks for the post-capture color transforms, driven by
//! randomized surfaces.

use camsnap::{apply, PixelSurface, Rgba, TransformKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_surface(rng: &mut StdRng, width: u32, height: u32) -> PixelSurface {
    let pixels = (0..(width as usize) * (height as usize))
        .map(|_| Rgba::new(rng.gen(), rng.gen(), rng.gen(), rng.gen()))
        .collect();
    PixelSurface::from_pixels(width, height, pixels).expect("buffer matches dimensions")
}

#[test]
fn every_transform_preserves_dimensions_and_alpha() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..16 {
        let width = rng.gen_range(1..32);
        let height = rng.gen_range(1..32);
        let surface = random_surface(&mut rng, width, height);

        for kind in TransformKind::ALL {
            let result = apply(&surface, kind);
            assert_eq!(result.width(), surface.width(), "{}", kind);
            assert_eq!(result.height(), surface.height(), "{}", kind);
            for (before, after) in surface.pixels().iter().zip(result.pixels()) {
                assert_eq!(after.a, before.a, "{} must not touch alpha", kind);
            }
        }
    }
}

#[test]
fn none_returns_an_observationally_equal_surface() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..16 {
        let surface = random_surface(&mut rng, 17, 9);
        assert_eq!(apply(&surface, TransformKind::None), surface);
    }
}

#[test]
fn invert_applied_twice_restores_the_input_exactly() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..16 {
        let surface = random_surface(&mut rng, 13, 11);
        let twice = apply(&apply(&surface, TransformKind::Invert), TransformKind::Invert);
        assert_eq!(twice, surface);
    }
}

#[test]
fn grayscale_output_is_achromatic_and_matches_the_luma_formula() {
    let mut rng = StdRng::seed_from_u64(4);
    let surface = random_surface(&mut rng, 24, 24);
    let result = apply(&surface, TransformKind::Grayscale);

    for (before, after) in surface.pixels().iter().zip(result.pixels()) {
        assert_eq!(after.r, after.g);
        assert_eq!(after.g, after.b);

        let luma = 0.299 * f32::from(before.r)
            + 0.587 * f32::from(before.g)
            + 0.114 * f32::from(before.b);
        assert_eq!(after.r, luma.round().clamp(0.0, 255.0) as u8);
    }
}

#[test]
fn sepia_never_brightens_any_channel() {
    let mut rng = StdRng::seed_from_u64(5);
    let surface = random_surface(&mut rng, 24, 24);
    let result = apply(&surface, TransformKind::SepiaTint);

    for (before, after) in surface.pixels().iter().zip(result.pixels()) {
        assert_eq!(after.r, before.r);
        assert!(after.g <= before.g);
        assert!(after.b <= before.b);
    }
}

#[test]
fn colored_transforms_are_distinct() {
    // One strongly colored surface must map to four distinct results
    let surface =
        PixelSurface::from_pixels(1, 1, vec![Rgba::new(200, 40, 90, 255)]).expect("1x1 buffer");

    let outputs: Vec<PixelSurface> = TransformKind::ALL
        .iter()
        .map(|kind| apply(&surface, *kind))
        .collect();

    for i in 0..outputs.len() {
        for j in (i + 1)..outputs.len() {
            assert_ne!(
                outputs[i], outputs[j],
                "{} and {} collided",
                TransformKind::ALL[i], TransformKind::ALL[j]
            );
        }
    }
}
