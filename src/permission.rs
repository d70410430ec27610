// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission gate
//!
//! The permission prompt is an external collaborator. The core only asks
//! whether access is granted and, if not, requests a grant and suspends
//! until the granted/denied callback arrives. The core never bypasses the
//! gate.

use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Binary permission gate the controller depends on
pub trait PermissionGate: Send + Sync {
    /// Whether camera access is currently granted
    fn is_granted(&self) -> bool;

    /// Request a grant. The decision is delivered through `reply`;
    /// dropping the sender without answering counts as a denial.
    fn request_grant(&self, reply: oneshot::Sender<bool>);
}

/// Gate with a fixed answer, resolved immediately
pub struct StaticGate {
    granted: bool,
}

impl StaticGate {
    pub fn granted() -> Self {
        Self { granted: true }
    }

    pub fn denied() -> Self {
        Self { granted: false }
    }
}

impl PermissionGate for StaticGate {
    fn is_granted(&self) -> bool {
        self.granted
    }

    fn request_grant(&self, reply: oneshot::Sender<bool>) {
        let _ = reply.send(self.granted);
    }
}

/// Gate that holds grant requests until `resolve` is called.
///
/// Models a real permission prompt: the controller suspends in
/// `PermissionPending` until the user answers.
#[derive(Default)]
pub struct DeferredGate {
    pending: Mutex<Vec<oneshot::Sender<bool>>>,
}

impl DeferredGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every pending grant request
    pub fn resolve(&self, granted: bool) {
        let mut pending = self.pending.lock().unwrap();
        debug!(count = pending.len(), granted, "Resolving permission requests");
        for reply in pending.drain(..) {
            let _ = reply.send(granted);
        }
    }
}

impl PermissionGate for DeferredGate {
    fn is_granted(&self) -> bool {
        false
    }

    fn request_grant(&self, reply: oneshot::Sender<bool>) {
        self.pending.lock().unwrap().push(reply);
    }
}
