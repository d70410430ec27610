// SPDX-License-Identifier: GPL-3.0-only

//! Preview frame sink
//!
//! The display layer is an external collaborator: the core pushes each
//! preview frame reference into a `DisplayTarget` and never renders or owns
//! the surface behind it.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// A single preview frame (RGBA, row-major, no padding)
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    /// Shared frame bytes; cloning a frame never copies pixel data
    pub data: Arc<[u8]>,
    /// Monotonic frame counter within one preview stream
    pub sequence: u64,
    /// Capture time, for latency diagnostics
    pub captured_at: Instant,
}

/// Sink for the repeating preview stream
pub trait DisplayTarget: Send + Sync {
    /// Called for every preview frame. Implementations must not block;
    /// frames may be dropped under backpressure.
    fn push_frame(&self, frame: PreviewFrame);
}

/// Display target that discards every frame
pub struct NullDisplay;

impl DisplayTarget for NullDisplay {
    fn push_frame(&self, _frame: PreviewFrame) {}
}

/// Channel-backed display target.
///
/// Forwards frames into a bounded channel; frames are dropped when the
/// consumer falls behind, which is acceptable for a live preview.
pub struct ChannelDisplay {
    sender: mpsc::Sender<PreviewFrame>,
}

impl ChannelDisplay {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PreviewFrame>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl DisplayTarget for ChannelDisplay {
    fn push_frame(&self, frame: PreviewFrame) {
        // Dropping on a full channel keeps the preview producer unblocked
        let _ = self.sender.try_send(frame);
    }
}
