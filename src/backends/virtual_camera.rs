// SPDX-License-Identifier: GPL-3.0-only

//! Software camera backend
//!
//! Synthesizes a moving gradient test pattern instead of reading a sensor,
//! while modeling real hardware semantics: an exclusive device claim, two
//! bound output targets, a threaded repeating preview stream and a depth-1
//! still-capture queue whose completion is delivered asynchronously.
//!
//! Fault injection flags allow exercising every acquisition error path
//! without hardware.

use super::preview_loop::{PreviewLoop, PreviewStep};
use super::{CameraBackend, CameraInfo, DeviceClaim, FrameHandle};
use crate::display::{DisplayTarget, PreviewFrame};
use crate::errors::{CaptureError, CaptureResult};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Preview sizes the virtual sensor advertises, in priority order
const ADVERTISED_SIZES: [(u32, u32); 3] = [(1920, 1080), (1280, 720), (640, 480)];

const CAMERA_ID: &str = "virtual-0";
const STILL_JPEG_QUALITY: u8 = 90;

/// Shared fault flags for driving the backend into failure modes
#[derive(Debug, Clone, Default)]
pub struct FaultInjection {
    /// `configure_outputs` fails with `ConfigurationFailed`
    pub fail_configure: Arc<AtomicBool>,
    /// Still captures never complete until aborted
    pub stall_capture: Arc<AtomicBool>,
    /// Still captures deliver a malformed buffer
    pub corrupt_still: Arc<AtomicBool>,
}

struct OutputBinding {
    display: Arc<dyn DisplayTarget>,
    width: u32,
    height: u32,
}

/// Camera backend producing synthesized frames
pub struct VirtualCameraBackend {
    claim: Arc<DeviceClaim>,
    opened: bool,
    output: Option<OutputBinding>,
    preview: Option<PreviewLoop>,
    capture_slot: Arc<AtomicBool>,
    /// Reply held back while `stall_capture` is set; dropped on abort
    stalled_reply: Option<oneshot::Sender<FrameHandle>>,
    sequence: Arc<AtomicU64>,
    faults: FaultInjection,
}

impl VirtualCameraBackend {
    pub fn new() -> Self {
        Self::with_claim(DeviceClaim::new())
    }

    /// Create a backend sharing a device claim with other backends,
    /// modeling two sessions contending for one physical camera.
    pub fn with_claim(claim: Arc<DeviceClaim>) -> Self {
        Self {
            claim,
            opened: false,
            output: None,
            preview: None,
            capture_slot: Arc::new(AtomicBool::new(false)),
            stalled_reply: None,
            sequence: Arc::new(AtomicU64::new(0)),
            faults: FaultInjection::default(),
        }
    }

    /// The device claim this backend contends on
    pub fn claim(&self) -> Arc<DeviceClaim> {
        Arc::clone(&self.claim)
    }

    /// Handles to the backend's fault flags
    pub fn faults(&self) -> FaultInjection {
        self.faults.clone()
    }

    fn synthesize_still(&self, width: u32, height: u32) -> CaptureResult<Vec<u8>> {
        let seq = self.sequence.load(Ordering::SeqCst);
        let img = RgbImage::from_fn(width, height, |x, y| {
            let [r, g, b, _] = pattern_pixel(x, y, width, height, seq);
            image::Rgb([r, g, b])
        });

        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, STILL_JPEG_QUALITY);
        encoder
            .encode(
                img.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::ConfigurationFailed(format!("still synthesis: {}", e)))?;
        Ok(buffer)
    }
}

impl Default for VirtualCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for VirtualCameraBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn enumerate_cameras(&self) -> Vec<CameraInfo> {
        vec![CameraInfo {
            id: CAMERA_ID.to_string(),
            name: "Virtual Camera".to_string(),
        }]
    }

    fn open(&mut self, camera_id: &str) -> CaptureResult<()> {
        if camera_id != CAMERA_ID {
            return Err(CaptureError::DeviceUnavailable);
        }
        if self.opened {
            return Ok(());
        }
        if !self.claim.try_claim() {
            debug!(camera = %camera_id, "Device already claimed");
            return Err(CaptureError::DeviceBusy);
        }
        info!(camera = %camera_id, "Opened virtual camera");
        self.opened = true;
        Ok(())
    }

    fn supported_preview_sizes(&self) -> Vec<(u32, u32)> {
        ADVERTISED_SIZES.to_vec()
    }

    fn configure_outputs(
        &mut self,
        display: Arc<dyn DisplayTarget>,
        width: u32,
        height: u32,
    ) -> CaptureResult<()> {
        if !self.opened {
            return Err(CaptureError::ConfigurationFailed(
                "device not open".to_string(),
            ));
        }
        if self.faults.fail_configure.load(Ordering::SeqCst) {
            return Err(CaptureError::ConfigurationFailed(
                "output binding rejected".to_string(),
            ));
        }

        // Reconfiguration tears down the running stream; the repeating
        // preview must be re-issued afterwards
        if let Some(mut preview) = self.preview.take() {
            preview.stop();
        }

        info!(width, height, "Configured preview and still outputs");
        self.output = Some(OutputBinding {
            display,
            width,
            height,
        });
        Ok(())
    }

    fn set_repeating_preview(&mut self, interval: Duration) -> CaptureResult<()> {
        let output = self.output.as_ref().ok_or_else(|| {
            CaptureError::ConfigurationFailed("outputs not configured".to_string())
        })?;

        if let Some(mut preview) = self.preview.take() {
            preview.stop();
        }

        let display = Arc::clone(&output.display);
        let (width, height) = (output.width, output.height);
        let sequence = Arc::clone(&self.sequence);

        self.preview = Some(PreviewLoop::start("virtual-preview", interval, move || {
            let seq = sequence.fetch_add(1, Ordering::SeqCst);
            display.push_frame(PreviewFrame {
                width,
                height,
                data: synthesize_preview(width, height, seq),
                sequence: seq,
                captured_at: Instant::now(),
            });
            PreviewStep::Continue
        }));
        Ok(())
    }

    fn capture_still(&mut self, reply: oneshot::Sender<FrameHandle>) -> CaptureResult<()> {
        let (width, height) = match &self.output {
            Some(output) => (output.width, output.height),
            None => {
                return Err(CaptureError::ConfigurationFailed(
                    "outputs not configured".to_string(),
                ))
            }
        };

        // Queue depth 1: reject, never buffer
        if self.capture_slot.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyInProgress);
        }

        if self.faults.stall_capture.load(Ordering::SeqCst) {
            debug!("Still capture stalled by fault injection");
            self.stalled_reply = Some(reply);
            return Ok(());
        }

        let bytes = if self.faults.corrupt_still.load(Ordering::SeqCst) {
            b"corrupt still buffer".to_vec()
        } else {
            match self.synthesize_still(width, height) {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.capture_slot.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            }
        };

        debug!(size = bytes.len(), "Still capture complete");
        let handle = FrameHandle::new(bytes, Arc::clone(&self.capture_slot));
        if reply.send(handle).is_err() {
            // Receiver abandoned the capture; the returned handle was
            // dropped by send, which already cleared the slot
            warn!("Still frame delivered to a dropped receiver");
        }
        Ok(())
    }

    fn abort_capture(&mut self) {
        if self.stalled_reply.take().is_some() {
            debug!("Aborting stalled still capture");
            self.capture_slot.store(false, Ordering::SeqCst);
        }
    }

    fn release(&mut self) {
        if let Some(mut preview) = self.preview.take() {
            preview.stop();
        }
        self.abort_capture();
        self.output = None;
        if self.opened {
            self.opened = false;
            self.claim.release();
            info!("Released virtual camera");
        }
    }
}

impl Drop for VirtualCameraBackend {
    fn drop(&mut self) {
        self.release();
    }
}

fn pattern_pixel(x: u32, y: u32, width: u32, height: u32, seq: u64) -> [u8; 4] {
    let r = (x * 255 / width.max(1)) as u8;
    let g = (y * 255 / height.max(1)) as u8;
    let b = (seq % 256) as u8;
    [r, g, b, 255]
}

fn synthesize_preview(width: u32, height: u32, seq: u64) -> Arc<[u8]> {
    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&pattern_pixel(x, y, width, height, seq));
        }
    }
    Arc::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;

    #[test]
    fn test_open_unknown_camera() {
        let mut backend = VirtualCameraBackend::new();
        assert_eq!(backend.open("nope"), Err(CaptureError::DeviceUnavailable));
    }

    #[test]
    fn test_shared_claim_is_busy() {
        let mut first = VirtualCameraBackend::new();
        let mut second = VirtualCameraBackend::with_claim(first.claim());

        first.open(CAMERA_ID).unwrap();
        assert_eq!(second.open(CAMERA_ID), Err(CaptureError::DeviceBusy));

        first.release();
        assert!(second.open(CAMERA_ID).is_ok());
    }

    #[test]
    fn test_capture_queue_depth_is_one() {
        let mut backend = VirtualCameraBackend::new();
        backend.faults().stall_capture.store(true, Ordering::SeqCst);

        backend.open(CAMERA_ID).unwrap();
        backend
            .configure_outputs(Arc::new(NullDisplay), 64, 48)
            .unwrap();

        let (tx1, _rx1) = oneshot::channel();
        backend.capture_still(tx1).unwrap();

        let (tx2, _rx2) = oneshot::channel();
        assert_eq!(
            backend.capture_still(tx2),
            Err(CaptureError::AlreadyInProgress)
        );

        // Abort returns the slot
        backend.abort_capture();
        let (tx3, _rx3) = oneshot::channel();
        backend.faults().stall_capture.store(false, Ordering::SeqCst);
        assert!(backend.capture_still(tx3).is_ok());
    }

    #[test]
    fn test_still_delivers_decodable_jpeg() {
        let mut backend = VirtualCameraBackend::new();
        backend.open(CAMERA_ID).unwrap();
        backend
            .configure_outputs(Arc::new(NullDisplay), 64, 48)
            .unwrap();

        let (tx, mut rx) = oneshot::channel();
        backend.capture_still(tx).unwrap();

        let handle = rx.try_recv().expect("still delivered synchronously");
        let decoded = image::load_from_memory(&handle.into_bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }
}
