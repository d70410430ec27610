// SPDX-License-Identifier: GPL-3.0-only

//! Capture pipeline configuration

use crate::constants::{
    DEFAULT_CAPTURE_TIMEOUT, DEFAULT_JPEG_QUALITY, DEFAULT_PREVIEW_BOUNDS, DEFAULT_PREVIEW_FPS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a camera controller instance
///
/// The capture timeout and preview cadence are not dictated by hardware;
/// they are configuration with documented defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Deadline for a single still capture before `CaptureTimeout` is reported
    pub capture_timeout: Duration,
    /// Repeating-preview frame cadence in frames per second
    pub preview_fps: u32,
    /// Requested preview bounds; the session negotiates the best
    /// advertised resolution that fits within them
    pub requested_width: u32,
    /// See `requested_width`
    pub requested_height: u32,
    /// JPEG quality (0-100) used when persisting captures
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            preview_fps: DEFAULT_PREVIEW_FPS,
            requested_width: DEFAULT_PREVIEW_BOUNDS.0,
            requested_height: DEFAULT_PREVIEW_BOUNDS.1,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CaptureConfig {
    /// Interval between preview frames at the configured cadence.
    ///
    /// Clamped to at least one millisecond so an extreme cadence cannot
    /// turn the preview thread into a busy spin.
    pub fn preview_interval(&self) -> Duration {
        let interval = Duration::from_micros(1_000_000 / u64::from(self.preview_fps.max(1)));
        interval.max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.capture_timeout, Duration::from_secs(3));
        assert_eq!(config.preview_fps, 30);
        assert_eq!(config.jpeg_quality, 92);
    }

    #[test]
    fn test_preview_interval_guards_zero_fps() {
        let config = CaptureConfig {
            preview_fps: 0,
            ..CaptureConfig::default()
        };
        assert_eq!(config.preview_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_preview_interval_keeps_sub_millisecond_precision() {
        assert_eq!(
            CaptureConfig::default().preview_interval(),
            Duration::from_micros(33_333)
        );
    }

    #[test]
    fn test_preview_interval_never_reaches_zero() {
        let config = CaptureConfig {
            preview_fps: 100_000,
            ..CaptureConfig::default()
        };
        assert_eq!(config.preview_interval(), Duration::from_millis(1));
    }
}
