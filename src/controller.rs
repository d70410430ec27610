// SPDX-License-Identifier: GPL-3.0-only

//! Camera controller state machine
//!
//! One controller owns one `SessionState` and drives it through explicit
//! events: permission resolution, device acquisition, still capture and
//! teardown. Hardware completions arrive on channels and are awaited by
//! the controller methods themselves, so state only ever mutates under the
//! controller lock. A single in-flight transition is enforced; concurrent
//! starts are rejected, never queued.
//!
//! ```text
//! Uninitialized --(permission granted)--> Opening
//! Opening --(opened + configured)-------> PreviewActive
//! Opening --(acquisition failed)--------> Error
//! PreviewActive --(capture_still)-------> Capturing --(frame decoded)--> PreviewActive
//! PreviewActive --(stop)----------------> Uninitialized
//! any --(stop)--------------------------> Uninitialized
//! ```

use crate::backends::{CameraBackend, CameraDescriptor};
use crate::config::CaptureConfig;
use crate::decode::FrameDecoder;
use crate::display::DisplayTarget;
use crate::errors::{CaptureError, CaptureResult};
use crate::permission::PermissionGate;
use crate::session::CaptureSession;
use crate::storage::{self, StorageSink};
use crate::surface::PixelSurface;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

/// Lifecycle state of a camera controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No resources held
    #[default]
    Uninitialized,
    /// Waiting for the permission gate to answer
    PermissionPending,
    /// Device acquisition and session configuration in progress
    Opening,
    /// Repeating preview running; still capture is valid
    PreviewActive,
    /// Exactly one still capture in flight
    Capturing,
    /// Unrecoverable acquisition failure; resources released; exits via `stop`
    Error,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::PermissionPending => "permission-pending",
            SessionState::Opening => "opening",
            SessionState::PreviewActive => "preview-active",
            SessionState::Capturing => "capturing",
            SessionState::Error => "error",
        };
        write!(f, "{}", name)
    }
}

struct ControllerInner {
    state: SessionState,
    session: CaptureSession,
    state_tx: watch::Sender<SessionState>,
}

impl ControllerInner {
    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "State transition");
            self.state = state;
            // Observers may come and go; the machine does not depend on them
            let _ = self.state_tx.send(state);
        }
    }
}

/// Releases the in-flight-transition claim on every exit path
struct TransitionGuard<'a>(&'a AtomicBool);

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The camera acquisition state machine.
///
/// Cheap to clone; all clones share one state machine. Methods take
/// `&self` and may be called concurrently — conflicting operations are
/// rejected with `AlreadyInProgress` rather than serialized.
#[derive(Clone)]
pub struct CameraController {
    inner: Arc<Mutex<ControllerInner>>,
    transition: Arc<AtomicBool>,
    gate: Arc<dyn PermissionGate>,
    config: CaptureConfig,
}

impl CameraController {
    pub fn new(
        backend: Box<dyn CameraBackend>,
        gate: Arc<dyn PermissionGate>,
        config: CaptureConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Uninitialized);
        Self {
            inner: Arc::new(Mutex::new(ControllerInner {
                state: SessionState::Uninitialized,
                session: CaptureSession::new(backend),
                state_tx,
            })),
            transition: Arc::new(AtomicBool::new(false)),
            gate,
            config,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    /// Subscribe to state transitions (for the display layer)
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.lock().unwrap().state_tx.subscribe()
    }

    /// The descriptor negotiated by the last successful start
    pub fn descriptor(&self) -> Option<CameraDescriptor> {
        self.inner.lock().unwrap().session.descriptor().cloned()
    }

    /// Gate on permission, acquire the device and bring the preview up.
    ///
    /// Idempotent when already in `PreviewActive`. A second concurrent
    /// call while acquisition is in flight returns `AlreadyInProgress`.
    /// Permission denial restores `Uninitialized`; hardware failures
    /// release all resources and settle in `Error`.
    pub async fn request_start(
        &self,
        display: Arc<dyn DisplayTarget>,
    ) -> CaptureResult<CameraDescriptor> {
        if self.transition.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyInProgress);
        }
        let _guard = TransitionGuard(&self.transition);

        {
            let inner = self.inner.lock().unwrap();
            match inner.state {
                SessionState::PreviewActive => {
                    let descriptor = inner
                        .session
                        .descriptor()
                        .cloned()
                        .expect("descriptor present while preview is active");
                    debug!(descriptor = %descriptor, "Preview already active");
                    return Ok(descriptor);
                }
                SessionState::Capturing => {
                    return Err(CaptureError::InvalidState(SessionState::Capturing))
                }
                // Error state is explicit and exits via stop()
                SessionState::Error => {
                    return Err(CaptureError::InvalidState(SessionState::Error))
                }
                SessionState::Uninitialized
                | SessionState::PermissionPending
                | SessionState::Opening => {}
            }
        }

        // Permission gate; the core never bypasses it
        let gated = !self.gate.is_granted();
        if gated {
            self.inner
                .lock()
                .unwrap()
                .set_state(SessionState::PermissionPending);

            let (reply, answer) = oneshot::channel();
            self.gate.request_grant(reply);
            let granted = answer.await.unwrap_or(false);

            if !granted {
                info!("Camera permission denied");
                self.inner
                    .lock()
                    .unwrap()
                    .set_state(SessionState::Uninitialized);
                return Err(CaptureError::PermissionDenied);
            }
        }

        // Acquisition and configuration happen under one lock hold; the
        // session start is synchronous from here on
        let mut inner = self.inner.lock().unwrap();
        if gated && inner.state != SessionState::PermissionPending {
            // A stop() issued while we were suspended on the gate already
            // released everything; the grant must not resurrect the session
            info!(state = %inner.state, "Start abandoned by concurrent stop");
            return Err(CaptureError::Cancelled);
        }
        inner.set_state(SessionState::Opening);

        let requested = (self.config.requested_width, self.config.requested_height);
        let interval = self.config.preview_interval();
        let started = match inner.session.start(display, requested) {
            Ok(descriptor) => inner
                .session
                .set_repeating_preview(interval)
                .map(|_| descriptor),
            Err(e) => Err(e),
        };

        match started {
            Ok(descriptor) => {
                inner.set_state(SessionState::PreviewActive);
                info!(descriptor = %descriptor, "Preview active");
                Ok(descriptor)
            }
            Err(e) => {
                // Release everything before surfacing; never left half-open
                inner.session.close();
                inner.set_state(SessionState::Error);
                warn!(error = %e, "Device acquisition failed");
                Err(e)
            }
        }
    }

    /// Capture one still frame and decode it to the negotiated resolution.
    ///
    /// Valid only from `PreviewActive`. Suspends until the hardware
    /// delivers the frame or `config.capture_timeout` elapses; on timeout
    /// or decode failure the preview is restored, never left broken. A
    /// concurrent `stop` surfaces as `Cancelled`.
    pub async fn capture_still(&self) -> CaptureResult<PixelSurface> {
        let (receiver, descriptor) = {
            let mut inner = self.inner.lock().unwrap();
            match inner.state {
                SessionState::PreviewActive => {}
                SessionState::Capturing => return Err(CaptureError::AlreadyInProgress),
                other => return Err(CaptureError::InvalidState(other)),
            }
            let receiver = inner.session.capture_once()?;
            let descriptor = inner
                .session
                .descriptor()
                .cloned()
                .expect("descriptor present while preview is active");
            inner.set_state(SessionState::Capturing);
            (receiver, descriptor)
        };

        match tokio::time::timeout(self.config.capture_timeout, receiver).await {
            Err(_elapsed) => {
                let mut inner = self.inner.lock().unwrap();
                inner.session.abort_capture();
                if inner.state == SessionState::Capturing {
                    inner.set_state(SessionState::PreviewActive);
                }
                warn!(timeout = ?self.config.capture_timeout, "Still capture timed out");
                Err(CaptureError::CaptureTimeout)
            }
            Ok(Err(_closed)) => {
                // Delivery channel torn down by a concurrent stop
                let mut inner = self.inner.lock().unwrap();
                if inner.state == SessionState::Capturing {
                    inner.set_state(SessionState::PreviewActive);
                }
                info!("Still capture cancelled");
                Err(CaptureError::Cancelled)
            }
            Ok(Ok(handle)) => {
                let mut inner = self.inner.lock().unwrap();
                if inner.state != SessionState::Capturing {
                    // Stopped while the frame was in flight; dropping the
                    // handle returns the capture slot
                    return Err(CaptureError::Cancelled);
                }
                debug!(size = handle.len(), "Still frame delivered");
                let decoded =
                    FrameDecoder::decode_frame(handle, descriptor.width, descriptor.height);
                // A failed decode is a failed still capture; the session
                // and the preview stay up
                inner.set_state(SessionState::PreviewActive);
                decoded
            }
        }
    }

    /// Release every hardware resource and return to `Uninitialized`.
    ///
    /// Safe to call from every state, including `Error` and immediately
    /// after construction. An in-flight capture is forcibly abandoned and
    /// its caller observes `Cancelled`.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        info!(state = %inner.state, "Stopping camera controller");
        inner.session.close();
        inner.set_state(SessionState::Uninitialized);
    }

    /// Hand a finished surface to the storage sink under a timestamped
    /// `IMG_*.jpg` filename. Storage failures never affect camera state.
    pub fn save_capture(
        &self,
        surface: &PixelSurface,
        sink: &dyn StorageSink,
    ) -> CaptureResult<PathBuf> {
        let filename = storage::suggested_filename();
        let path = sink.persist(surface, &filename)?;
        info!(path = %path.display(), "Capture persisted");
        Ok(path)
    }
}

impl std::fmt::Debug for CameraController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraController")
            .field("state", &self.state())
            .finish()
    }
}
