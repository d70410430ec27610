// SPDX-License-Identifier: GPL-3.0-only

//! Capture session
//!
//! Owns the camera device claim, the negotiated descriptor and the two
//! bound output targets (continuous preview + single-shot still reader).
//! Every exit path — including error propagation — funnels through
//! `close()`, so no hardware resource outlives the session.

use crate::backends::{CameraBackend, CameraDescriptor, FrameHandle};
use crate::controller::SessionState;
use crate::display::DisplayTarget;
use crate::errors::{CaptureError, CaptureResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Negotiated binding between one camera device and its output targets
pub struct CaptureSession {
    backend: Box<dyn CameraBackend>,
    descriptor: Option<CameraDescriptor>,
}

impl CaptureSession {
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            backend,
            descriptor: None,
        }
    }

    /// Whether a device is currently attached
    pub fn is_attached(&self) -> bool {
        self.descriptor.is_some()
    }

    /// The descriptor negotiated by the last successful `start`
    pub fn descriptor(&self) -> Option<&CameraDescriptor> {
        self.descriptor.as_ref()
    }

    /// Open the first enumerable camera, negotiate a preview resolution
    /// within `requested` bounds and bind both output targets.
    ///
    /// Starting while already attached tears down the old attachment
    /// first; a session never holds two device claims.
    pub fn start(
        &mut self,
        display: Arc<dyn DisplayTarget>,
        requested: (u32, u32),
    ) -> CaptureResult<CameraDescriptor> {
        if self.is_attached() {
            debug!("Tearing down previous attachment before restart");
            self.close();
        }

        if !self.backend.is_available() {
            return Err(CaptureError::DeviceUnavailable);
        }
        let cameras = self.backend.enumerate_cameras();
        let camera = cameras.first().ok_or(CaptureError::DeviceUnavailable)?;

        self.backend.open(&camera.id)?;

        let (width, height) =
            negotiate_preview_size(&self.backend.supported_preview_sizes(), requested);

        if let Err(e) = self.backend.configure_outputs(display, width, height) {
            // Never leave the device half-open behind a failed configure
            self.backend.release();
            return Err(e);
        }

        let descriptor = CameraDescriptor {
            camera_id: camera.id.clone(),
            width,
            height,
        };
        info!(descriptor = %descriptor, "Capture session started");
        self.descriptor = Some(descriptor.clone());
        Ok(descriptor)
    }

    /// Issue the repeating auto preview stream at the given frame interval
    pub fn set_repeating_preview(&mut self, interval: Duration) -> CaptureResult<()> {
        if !self.is_attached() {
            return Err(CaptureError::InvalidState(SessionState::Uninitialized));
        }
        self.backend.set_repeating_preview(interval)
    }

    /// Issue exactly one still capture, independent of the preview stream.
    ///
    /// Completion arrives on the returned channel; a second call while one
    /// is unresolved is rejected with `AlreadyInProgress` (queue depth 1).
    pub fn capture_once(&mut self) -> CaptureResult<oneshot::Receiver<FrameHandle>> {
        if !self.is_attached() {
            return Err(CaptureError::InvalidState(SessionState::Uninitialized));
        }
        let (reply, receiver) = oneshot::channel();
        self.backend.capture_still(reply)?;
        Ok(receiver)
    }

    /// Forcibly abandon an in-flight still capture
    pub fn abort_capture(&mut self) {
        self.backend.abort_capture();
    }

    /// Release reader, session and device. Tolerates being called when
    /// nothing is open.
    pub fn close(&mut self) {
        if self.descriptor.take().is_some() {
            info!("Closing capture session");
        }
        self.backend.release();
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pick the highest-priority advertised size fitting within the requested
/// bounds, falling back to the requested bounds when nothing fits.
fn negotiate_preview_size(advertised: &[(u32, u32)], requested: (u32, u32)) -> (u32, u32) {
    advertised
        .iter()
        .copied()
        .find(|(w, h)| *w <= requested.0 && *h <= requested.1)
        .unwrap_or(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [(u32, u32); 3] = [(1920, 1080), (1280, 720), (640, 480)];

    #[test]
    fn test_negotiate_exact_match() {
        assert_eq!(negotiate_preview_size(&SIZES, (1920, 1080)), (1920, 1080));
    }

    #[test]
    fn test_negotiate_steps_down() {
        assert_eq!(negotiate_preview_size(&SIZES, (1600, 900)), (1280, 720));
    }

    #[test]
    fn test_negotiate_falls_back_to_requested() {
        assert_eq!(negotiate_preview_size(&SIZES, (320, 240)), (320, 240));
        assert_eq!(negotiate_preview_size(&[], (800, 600)), (800, 600));
    }
}
