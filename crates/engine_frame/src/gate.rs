//! Wait/signal gates.
//!
//! A [`Gate`] is a capacity-one channel of unit tokens: `signal` deposits a
//! token if none is waiting, `wait` blocks until it can take one. Signals do
//! not accumulate, so a gate signalled twice before anyone waits still wakes
//! exactly one wait.
//!
//! [`FrameGates`] bundles the gates of one scheduler with its closing flag.
//! Shutdown sets the flag first and then signals every gate. A thread that
//! wakes and sees the flag signals the gate again before returning, so every
//! thread blocked on the same gate is woken in turn.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use tracing::info;

/// A one-shot wake-up signal.
#[derive(Debug, Clone)]
pub struct Gate {
    name: &'static str,
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Gate {
    /// Create an unsignalled gate.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = bounded(1);
        Self { name, tx, rx }
    }

    /// Returns the gate's name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Deposit a token. Returns `false` if one was already waiting.
    pub fn signal(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(()) | TrySendError::Disconnected(())) => false,
        }
    }

    /// Block until a token is available and take it.
    pub fn wait(&self) {
        // The gate owns a sender, so the channel never disconnects.
        let _ = self.rx.recv();
    }

    /// Like [`Gate::wait`] but gives up after `timeout`. Returns `true` if a
    /// token was taken.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => true,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Discard a pending token, if any.
    pub fn clear(&self) {
        let _ = self.rx.try_recv();
    }

    /// Returns `true` if a token is waiting.
    #[must_use]
    pub fn is_signalled(&self) -> bool {
        !self.rx.is_empty()
    }
}

#[derive(Debug)]
struct GatesInner {
    update: Gate,
    render: Gate,
    step: Gate,
    frame_done: Gate,
    closing: AtomicBool,
    stepper: Mutex<()>,
}

/// The gates shared by one scheduler's threads.
///
/// | Gate         | Waited on by  | Signalled by                        |
/// |--------------|---------------|-------------------------------------|
/// | `update`     | update thread | render thread, after drawing        |
/// | `render`     | render thread | update thread, after sync           |
/// | `step`       | update thread | single-step caller                  |
/// | `frame_done` | step caller   | render thread, after drawing        |
#[derive(Debug, Clone)]
pub struct FrameGates {
    inner: Arc<GatesInner>,
}

impl Default for FrameGates {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGates {
    /// Create a set of unsignalled gates.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GatesInner {
                update: Gate::new("update"),
                render: Gate::new("render"),
                step: Gate::new("step"),
                frame_done: Gate::new("frame_done"),
                closing: AtomicBool::new(false),
                stepper: Mutex::new(()),
            }),
        }
    }

    /// Gate the update thread waits on before each frame.
    #[must_use]
    pub fn update(&self) -> &Gate {
        &self.inner.update
    }

    /// Gate the render thread waits on before each frame.
    #[must_use]
    pub fn render(&self) -> &Gate {
        &self.inner.render
    }

    /// Gate that releases one frame in single-step mode.
    #[must_use]
    pub fn step(&self) -> &Gate {
        &self.inner.step
    }

    /// Gate signalled whenever a frame finishes rendering.
    #[must_use]
    pub fn frame_done(&self) -> &Gate {
        &self.inner.frame_done
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.inner.closing.load(Ordering::Acquire)
    }

    /// Wait on `gate` unless closing. Returns `true` if the caller should
    /// proceed, `false` if it must return because the scheduler is closing.
    pub fn pass(&self, gate: &Gate) -> bool {
        if self.is_closing() {
            return false;
        }
        gate.wait();
        if self.is_closing() {
            // Hand the shutdown token on to the next waiter.
            gate.signal();
            return false;
        }
        true
    }

    /// Take the single-step lock. Step requests are made one at a time so
    /// that each one releases and observes its own frame.
    pub fn lock_stepper(&self) -> MutexGuard<'_, ()> {
        self.inner
            .stepper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the closing flag and signal every gate.
    ///
    /// Safe to call from any thread, any number of times, including while
    /// other threads are blocked on any of the gates.
    pub fn shutdown(&self) {
        if !self.inner.closing.swap(true, Ordering::AcqRel) {
            info!("frame scheduler closing");
        }
        for gate in [
            &self.inner.update,
            &self.inner.render,
            &self.inner.step,
            &self.inner.frame_done,
        ] {
            gate.signal();
        }
    }
}
