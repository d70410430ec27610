// SPDX-License-Identifier: GPL-3.0-only

//! camsnap - camera acquisition state machine and still-image filter pipeline
//!
//! This crate coordinates an asynchronous camera resource (device → capture
//! session → repeating preview → one-shot still capture → sensor buffer),
//! decodes captured buffers into owned pixel surfaces and applies
//! deterministic color transforms before handoff to storage.
//!
//! # Architecture
//!
//! - [`controller`]: the `CameraController` state machine (top of stack)
//! - [`session`]: device claim, resolution negotiation and output binding
//! - [`backends`]: camera hardware abstraction + the virtual camera
//! - [`decode`]: still-buffer decoding and deterministic resize
//! - [`filters`]: pure post-capture color transforms
//! - [`storage`]: gallery writer and timestamped filenames
//! - [`permission`] / [`display`]: external collaborator seams
//!
//! # Example
//!
//! ```no_run
//! use camsnap::{
//!     apply, CameraController, CaptureConfig, NullDisplay, StaticGate, TransformKind,
//!     VirtualCameraBackend,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> camsnap::CaptureResult<()> {
//! let controller = CameraController::new(
//!     Box::new(VirtualCameraBackend::new()),
//!     Arc::new(StaticGate::granted()),
//!     CaptureConfig::default(),
//! );
//!
//! controller.request_start(Arc::new(NullDisplay)).await?;
//! let capture = controller.capture_still().await?;
//! let filtered = apply(&capture, TransformKind::Grayscale);
//! controller.stop();
//! # let _ = filtered;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod controller;
pub mod decode;
pub mod display;
pub mod errors;
pub mod filters;
pub mod permission;
pub mod session;
pub mod storage;
pub mod surface;

// Re-export commonly used types
pub use backends::{CameraBackend, CameraDescriptor, CameraInfo, DeviceClaim, FrameHandle,
    VirtualCameraBackend};
pub use config::CaptureConfig;
pub use controller::{CameraController, SessionState};
pub use decode::FrameDecoder;
pub use display::{ChannelDisplay, DisplayTarget, NullDisplay, PreviewFrame};
pub use errors::{CaptureError, CaptureResult};
pub use filters::{apply, TransformKind};
pub use permission::{DeferredGate, PermissionGate, StaticGate};
pub use session::CaptureSession;
pub use storage::{suggested_filename, GalleryWriter, StorageSink};
pub use surface::{PixelSurface, Rgba};
