// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture pipeline

use crate::controller::SessionState;
use std::fmt;

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Unified error type for camera acquisition, decoding and storage
///
/// Hardware failures (`DeviceUnavailable`, `DeviceBusy`, `ConfigurationFailed`)
/// drive the controller into the `Error` state with all resources released.
/// Caller-misuse errors (`AlreadyInProgress`, `InvalidState`) are reported
/// without touching hardware state. `Decode` on a single still capture keeps
/// the preview alive, and `Io` from the storage sink never affects camera state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Camera permission was denied by the permission gate
    PermissionDenied,
    /// No camera hardware is enumerable
    DeviceUnavailable,
    /// The camera device is already claimed elsewhere
    DeviceBusy,
    /// The capture session could not bind the requested output targets
    ConfigurationFailed(String),
    /// The hardware did not deliver a still frame before the deadline
    CaptureTimeout,
    /// A transition or capture is already in flight
    AlreadyInProgress,
    /// Operation invoked in a state where it is not valid
    InvalidState(SessionState),
    /// The still-image buffer could not be decoded
    Decode(String),
    /// The operation was abandoned by a concurrent stop
    Cancelled,
    /// Storage sink failure
    Io(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::PermissionDenied => write!(f, "Camera permission denied"),
            CaptureError::DeviceUnavailable => write!(f, "No camera device available"),
            CaptureError::DeviceBusy => write!(f, "Camera device is busy"),
            CaptureError::ConfigurationFailed(msg) => {
                write!(f, "Failed to configure capture session: {}", msg)
            }
            CaptureError::CaptureTimeout => write!(f, "Still capture timed out"),
            CaptureError::AlreadyInProgress => write!(f, "Operation already in progress"),
            CaptureError::InvalidState(state) => {
                write!(f, "Operation not valid in state {}", state)
            }
            CaptureError::Decode(msg) => write!(f, "Failed to decode still frame: {}", msg),
            CaptureError::Cancelled => write!(f, "Capture cancelled"),
            CaptureError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Decode(err.to_string())
    }
}
