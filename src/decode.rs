// SPDX-License-Identifier: GPL-3.0-only

//! Still-frame decoding
//!
//! Converts the opaque compressed buffer delivered by the camera hardware
//! into an owned `PixelSurface`, resizing to the target bounds when needed.
//! Decode failures surface as a failed still capture and never tear down
//! the session.

use crate::backends::FrameHandle;
use crate::errors::{CaptureError, CaptureResult};
use crate::surface::PixelSurface;
use image::imageops::FilterType;
use tracing::debug;

/// Decoder for hardware-delivered still buffers
pub struct FrameDecoder;

impl FrameDecoder {
    /// Decode a compressed (JPEG) byte buffer into a pixel surface.
    ///
    /// The output is resized to exactly `target_width` × `target_height`
    /// using linear (triangle) filtering, so decode output size is
    /// deterministic given input and target size.
    pub fn decode(
        bytes: &[u8],
        target_width: u32,
        target_height: u32,
    ) -> CaptureResult<PixelSurface> {
        if target_width == 0 || target_height == 0 {
            return Err(CaptureError::Decode("zero target dimensions".to_string()));
        }
        if bytes.is_empty() {
            return Err(CaptureError::Decode("empty still buffer".to_string()));
        }

        let decoded = image::load_from_memory(bytes)?;
        let (width, height) = (decoded.width(), decoded.height());

        let resized = if (width, height) == (target_width, target_height) {
            decoded
        } else {
            debug!(
                from = %format!("{}x{}", width, height),
                to = %format!("{}x{}", target_width, target_height),
                "Resizing decoded still"
            );
            decoded.resize_exact(target_width, target_height, FilterType::Triangle)
        };

        Ok(PixelSurface::from_rgba_image(resized.to_rgba8()))
    }

    /// Decode a hardware frame handle, releasing it exactly once.
    ///
    /// The handle's buffer is extracted (which returns the capture slot to
    /// the hardware) before decoding, so the handle is released even when
    /// the buffer turns out to be malformed.
    pub fn decode_frame(
        handle: FrameHandle,
        target_width: u32,
        target_height: u32,
    ) -> CaptureResult<PixelSurface> {
        let bytes = handle.into_bytes();
        Self::decode(&bytes, target_width, target_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::RgbImage;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, 90);
        encoder
            .encode(
                img.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )
            .unwrap();
        buffer
    }

    #[test]
    fn test_decode_keeps_matching_dimensions() {
        let bytes = jpeg_bytes(64, 48);
        let surface = FrameDecoder::decode(&bytes, 64, 48).unwrap();
        assert_eq!((surface.width(), surface.height()), (64, 48));
    }

    #[test]
    fn test_decode_resizes_to_target() {
        let bytes = jpeg_bytes(64, 48);
        let surface = FrameDecoder::decode(&bytes, 32, 24).unwrap();
        assert_eq!((surface.width(), surface.height()), (32, 24));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let bytes = jpeg_bytes(40, 30);
        let a = FrameDecoder::decode(&bytes, 20, 20).unwrap();
        let b = FrameDecoder::decode(&bytes, 20, 20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_input_is_a_decode_error() {
        let result = FrameDecoder::decode(b"not a jpeg", 16, 16);
        assert!(matches!(result, Err(CaptureError::Decode(_))));
    }

    #[test]
    fn test_empty_input_is_a_decode_error() {
        let result = FrameDecoder::decode(&[], 16, 16);
        assert!(matches!(result, Err(CaptureError::Decode(_))));
    }
}
