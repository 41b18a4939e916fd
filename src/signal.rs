//! # Cooperative stop signal.
//!
//! [`Signal`] is the flag a service raises when `stop` is requested. Tasks poll
//! it from `run`; it never wakes anything up by itself.
//!
//! ## Rules
//! - `signal()` is idempotent and uses release ordering.
//! - `is_signalled()` uses acquire ordering, so a task that observes `true`
//!   also observes everything the stopping thread wrote before `stop()`.
//! - Only the owning service resets the flag, after a run has completed.

use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe tri-operation boolean flag.
///
/// ```
/// use taskservice::Signal;
///
/// let s = Signal::new();
/// assert!(!s.is_signalled());
/// s.signal();
/// s.signal();
/// assert!(s.is_signalled());
/// s.reset();
/// assert!(!s.is_signalled());
/// ```
#[derive(Debug, Default)]
pub struct Signal {
    flag: AtomicBool,
}

impl Signal {
    /// Creates a cleared signal.
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Raises the signal.
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Clears the signal.
    ///
    /// Tasks must not call this on the signal handed to `run`.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    /// Returns `true` once the signal has been raised and not yet reset.
    #[inline]
    pub fn is_signalled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
