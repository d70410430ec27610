// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline-wide constants

use std::time::Duration;

/// BT.601 luminance weight for the red channel
pub const LUMA_R: f32 = 0.299;
/// BT.601 luminance weight for the green channel
pub const LUMA_G: f32 = 0.587;
/// BT.601 luminance weight for the blue channel
pub const LUMA_B: f32 = 0.114;

/// Sepia tint per-channel scale factors (R, G, B)
pub const SEPIA_SCALE: [f32; 3] = [1.0, 0.8, 0.5];

/// Default deadline for a single still capture.
///
/// The hardware is expected to deliver a frame well within one second;
/// three seconds leaves headroom for slow auto-exposure convergence.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default repeating-preview frame cadence
pub const DEFAULT_PREVIEW_FPS: u32 = 30;

/// Default requested preview bounds (width, height)
pub const DEFAULT_PREVIEW_BOUNDS: (u32, u32) = (1280, 720);

/// Default JPEG quality for saved photos (0-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 92;
