// SPDX-License-Identifier: GPL-3.0-only

//! Camera hardware abstraction
//!
//! A `CameraBackend` owns the path to one physical (or synthesized) camera:
//! enumeration, exclusive open, output configuration, the repeating preview
//! stream and depth-1 still capture. Completion of a still capture is
//! asynchronous and delivered over a oneshot channel, mirroring hardware
//! callback delivery.

pub mod preview_loop;
pub mod virtual_camera;

pub use virtual_camera::{FaultInjection, VirtualCameraBackend};

use crate::display::DisplayTarget;
use crate::errors::CaptureResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::warn;

/// An enumerable camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// Stable identifier for the physical camera
    pub id: String,
    /// Human-readable name
    pub name: String,
}

/// Identifier for a camera plus its negotiated preview resolution.
///
/// Resolved once while the session opens; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDescriptor {
    pub camera_id: String,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for CameraDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}x{}", self.camera_id, self.width, self.height)
    }
}

/// Opaque handle to a hardware-owned still buffer.
///
/// The capture queue has depth 1: the slot behind this handle must be
/// returned exactly once, either by `into_bytes` (the decoder path) or by
/// dropping the handle. An unreleased handle would exhaust the queue and
/// block every later capture.
pub struct FrameHandle {
    bytes: Option<Vec<u8>>,
    slot: Arc<AtomicBool>,
    released: bool,
}

impl FrameHandle {
    pub(crate) fn new(bytes: Vec<u8>, slot: Arc<AtomicBool>) -> Self {
        Self {
            bytes: Some(bytes),
            slot,
            released: false,
        }
    }

    /// Size of the compressed buffer in bytes
    pub fn len(&self) -> usize {
        self.bytes.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extract the buffer, releasing the hardware capture slot
    pub fn into_bytes(mut self) -> Vec<u8> {
        let bytes = self.bytes.take().unwrap_or_default();
        self.release();
        bytes
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.slot.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        if self.bytes.take().is_some() {
            warn!("Frame handle dropped without decoding");
        }
        self.release();
    }
}

impl std::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameHandle({} bytes)", self.len())
    }
}

/// Exclusive claim on one physical camera.
///
/// No two sessions may hold an open handle to the same device; acquisition
/// fails fast instead of blocking.
#[derive(Debug, Default)]
pub struct DeviceClaim {
    held: AtomicBool,
}

impl DeviceClaim {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Try to take the claim; `false` means the device is already held
    pub fn try_claim(&self) -> bool {
        !self.held.swap(true, Ordering::SeqCst)
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

/// Camera backend trait
///
/// The capture session drives a backend through this interface; the
/// controller never touches a backend directly.
pub trait CameraBackend: Send {
    /// Check whether this backend can produce frames on this system
    fn is_available(&self) -> bool;

    /// Enumerate cameras this backend can open
    fn enumerate_cameras(&self) -> Vec<CameraInfo>;

    /// Claim and open a camera device.
    ///
    /// Fails fast with `DeviceBusy` when the device is already claimed
    /// elsewhere, `DeviceUnavailable` when the id is unknown.
    fn open(&mut self, camera_id: &str) -> CaptureResult<()>;

    /// Preview sizes the opened device advertises, in priority order
    fn supported_preview_sizes(&self) -> Vec<(u32, u32)>;

    /// Bind the two concurrent output targets: the continuous preview
    /// sink and the single-shot still reader at the given resolution.
    fn configure_outputs(
        &mut self,
        display: Arc<dyn DisplayTarget>,
        width: u32,
        height: u32,
    ) -> CaptureResult<()>;

    /// Issue the continuous auto-exposure/auto-focus preview stream at
    /// the given frame interval. Fire-and-forget; must be re-issued after
    /// reconfiguration.
    fn set_repeating_preview(&mut self, interval: Duration) -> CaptureResult<()>;

    /// Issue exactly one still capture, independent of the preview stream.
    ///
    /// The frame is delivered through `reply` when the hardware completes.
    /// Rejected with `AlreadyInProgress` while a capture is unresolved
    /// (queue depth 1).
    fn capture_still(&mut self, reply: oneshot::Sender<FrameHandle>) -> CaptureResult<()>;

    /// Forcibly abandon an in-flight still capture, returning the queue
    /// slot. No-op when nothing is in flight.
    fn abort_capture(&mut self);

    /// Release the device claim and every output. Idempotent.
    fn release(&mut self);
}
