// SPDX-License-Identifier: GPL-3.0-only

//! Paced worker thread behind the repeating preview stream
//!
//! One preview stream is one background thread ticking at the negotiated
//! frame cadence. The loop owns its own pacing: the tick callback only
//! produces a frame, and a stop request interrupts the inter-frame wait
//! instead of waiting out the cadence.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What the tick callback wants the loop to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStep {
    /// Produce the next frame after one cadence interval
    Continue,
    /// End the stream from inside the producer
    Stop,
}

/// Shutdown latch shared between the owner and the worker thread.
///
/// A condvar rather than a bare flag, so a stop request wakes the worker
/// out of its inter-frame wait immediately.
struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl Shutdown {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    fn trigger(&self) {
        *self.stopped.lock().unwrap() = true;
        self.signal.notify_all();
    }

    /// Wait out one cadence interval; `true` means stop was requested
    fn wait(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let mut stopped = self.stopped.lock().unwrap();
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _timeout) = self.signal.wait_timeout(stopped, deadline - now).unwrap();
            stopped = guard;
        }
        true
    }
}

/// A repeating preview stream running on its own paced thread
pub struct PreviewLoop {
    worker: Option<JoinHandle<()>>,
    shutdown: Arc<Shutdown>,
    name: String,
}

impl PreviewLoop {
    /// Spawn the stream thread.
    ///
    /// `tick` is invoked once immediately and then once per `interval`,
    /// until it returns [`PreviewStep::Stop`] or the loop is stopped.
    pub fn start<F>(name: &str, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> PreviewStep + Send + 'static,
    {
        let shutdown = Arc::new(Shutdown::new());
        let latch = Arc::clone(&shutdown);
        let thread_name = name.to_string();

        info!(name = %name, interval = ?interval, "Starting preview stream");
        let worker = std::thread::spawn(move || loop {
            if tick() == PreviewStep::Stop {
                debug!(name = %thread_name, "Preview stream ended by producer");
                break;
            }
            if latch.wait(interval) {
                debug!(name = %thread_name, "Preview stream stopped");
                break;
            }
        });

        Self {
            worker: Some(worker),
            shutdown,
            name: name.to_string(),
        }
    }

    /// Whether the stream thread is still alive
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the stream and wait for the thread to exit.
    ///
    /// Interrupts the inter-frame wait, so teardown is prompt even at a
    /// very low frame cadence.
    pub fn stop(&mut self) {
        self.shutdown.trigger();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.join() {
                warn!(name = %self.name, "Preview thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for PreviewLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_producer_ends_the_stream() {
        let frames = Arc::new(AtomicU32::new(0));
        let produced = Arc::clone(&frames);

        let mut preview = PreviewLoop::start("test-stream", Duration::from_millis(1), move || {
            if produced.fetch_add(1, Ordering::SeqCst) < 4 {
                PreviewStep::Continue
            } else {
                PreviewStep::Stop
            }
        });

        let begun = Instant::now();
        while preview.is_running() {
            assert!(begun.elapsed() < Duration::from_secs(5), "stream never ended");
            std::thread::yield_now();
        }

        preview.stop();
        assert_eq!(frames.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_stop_interrupts_the_inter_frame_wait() {
        let frames = Arc::new(AtomicU32::new(0));
        let produced = Arc::clone(&frames);

        let mut preview =
            PreviewLoop::start("test-slow-stream", Duration::from_secs(60), move || {
                produced.fetch_add(1, Ordering::SeqCst);
                PreviewStep::Continue
            });

        // The first tick runs immediately; after it the loop sits in a
        // 60 second wait
        let begun = Instant::now();
        while frames.load(Ordering::SeqCst) == 0 {
            assert!(begun.elapsed() < Duration::from_secs(5), "first tick never ran");
            std::thread::yield_now();
        }

        let stopping = Instant::now();
        preview.stop();
        assert!(stopping.elapsed() < Duration::from_secs(5));
        assert_eq!(frames.load(Ordering::SeqCst), 1);
        assert!(!preview.is_running());
    }

    #[test]
    fn test_drop_stops_the_stream() {
        let preview = PreviewLoop::start("test-drop", Duration::from_millis(1), || {
            PreviewStep::Continue
        });
        assert!(preview.is_running());
        drop(preview);
    }
}
