// SPDX-License-Identifier: GPL-3.0-only

//! Photo storage sink
//!
//! The gallery writer is an external collaborator from the camera core's
//! point of view: it receives a finished `PixelSurface` plus a suggested
//! filename and reports where the image landed. Storage failures never
//! affect camera state.

use crate::errors::{CaptureError, CaptureResult};
use crate::surface::PixelSurface;
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sink for finished captures
pub trait StorageSink: Send + Sync {
    /// Persist a surface under the suggested filename, returning the
    /// location of the stored image.
    fn persist(&self, surface: &PixelSurface, filename: &str) -> CaptureResult<PathBuf>;
}

/// Suggested filename for a capture taken now: `IMG_<timestamp>.jpg`
pub fn suggested_filename() -> String {
    filename_for(Local::now())
}

/// Suggested filename for a capture taken at `timestamp`
pub fn filename_for(timestamp: DateTime<Local>) -> String {
    format!("IMG_{}.jpg", timestamp.format("%Y%m%d_%H%M%S"))
}

/// Gallery writer that JPEG-encodes surfaces into a directory
pub struct GalleryWriter {
    directory: PathBuf,
    jpeg_quality: u8,
}

impl GalleryWriter {
    pub fn new(directory: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            directory: directory.into(),
            jpeg_quality,
        }
    }

    /// Default photo directory: the user's pictures directory, falling
    /// back to the system temp directory when none is configured.
    pub fn default_directory() -> PathBuf {
        dirs::picture_dir().unwrap_or_else(std::env::temp_dir)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Encode a surface as JPEG at the writer's quality setting.
    ///
    /// JPEG carries no alpha channel; the surface is flattened to RGB.
    fn encode_jpeg(&self, surface: &PixelSurface) -> CaptureResult<Vec<u8>> {
        let rgb = image::DynamicImage::ImageRgba8(surface.to_rgba_image()).to_rgb8();

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality);
        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::Io(format!("JPEG encoding failed: {}", e)))?;

        debug!(size = buffer.len(), "Encoded capture");
        Ok(buffer)
    }
}

impl StorageSink for GalleryWriter {
    fn persist(&self, surface: &PixelSurface, filename: &str) -> CaptureResult<PathBuf> {
        let encoded = self.encode_jpeg(surface)?;

        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(filename);
        std::fs::write(&path, &encoded)?;

        info!(path = %path.display(), "Photo saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filename_format() {
        let timestamp = Local.with_ymd_and_hms(2026, 8, 30, 14, 5, 9).unwrap();
        assert_eq!(filename_for(timestamp), "IMG_20260830_140509.jpg");
    }

    #[test]
    fn test_suggested_filename_shape() {
        let name = suggested_filename();
        assert!(name.starts_with("IMG_"));
        assert!(name.ends_with(".jpg"));
        // IMG_ + yyyymmdd + _ + hhmmss + .jpg
        assert_eq!(name.len(), 4 + 8 + 1 + 6 + 4);
    }
}
