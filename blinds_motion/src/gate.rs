//! Admission gate.
//!
//! A binary token that limits the engine to one move at a time.
//! `try_acquire` never waits. Acquiring yields an [`AdmissionPermit`] that is
//! moved into the worker together with the request; the gate is released
//! when the worker drops the permit. Submitters have no way to release the
//! gate themselves.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

struct GateInner {
    held: Mutex<bool>,
    released: Condvar,
}

/// Binary mutual-exclusion token, created free.
#[derive(Clone)]
pub struct AdmissionGate {
    inner: Arc<GateInner>,
}

/// Result of a non-blocking acquire.
#[must_use]
pub enum GateResult {
    /// Gate taken; the permit releases it on drop.
    Acquired(AdmissionPermit),
    /// A move is in flight.
    Busy,
}

/// Proof of holding the gate. Not cloneable.
pub struct AdmissionPermit {
    inner: Arc<GateInner>,
}

impl AdmissionGate {
    /// Create a free gate.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(GateInner {
                held: Mutex::new(false),
                released: Condvar::new(),
            }),
        }
    }

    /// Take the gate if it is free. Never blocks on a held gate.
    pub fn try_acquire(&self) -> GateResult {
        let mut held = self.inner.held.lock();
        if *held {
            trace!("Admission gate busy");
            return GateResult::Busy;
        }
        *held = true;
        trace!("Admission gate acquired");
        GateResult::Acquired(AdmissionPermit {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Whether a permit is outstanding.
    pub fn is_held(&self) -> bool {
        *self.inner.held.lock()
    }

    /// Wait until the gate is free or `timeout` elapses.
    ///
    /// Returns `true` if the gate is free on return.
    pub fn wait_free(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut held = self.inner.held.lock();
        while *held {
            if self.inner.released.wait_until(&mut held, deadline).timed_out() {
                return !*held;
            }
        }
        true
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let mut held = self.inner.held.lock();
        *held = false;
        self.inner.released.notify_all();
        trace!("Admission gate released");
    }
}
