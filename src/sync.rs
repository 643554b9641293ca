//! Synchronization primitives behind the ticket pool.
//!
//! Built with `--cfg harness_loom`, the pool runs on Loom's instrumented types so model tests can
//! explore every interleaving of the check-then-act window.

use std::time::Duration;

#[cfg(harness_loom)]
pub(crate) use loom::sync::Mutex;
#[cfg(harness_loom)]
pub(crate) use loom::sync::atomic::AtomicI64;

#[cfg(not(harness_loom))]
pub(crate) use std::sync::Mutex;
#[cfg(not(harness_loom))]
pub(crate) use std::sync::atomic::AtomicI64;

/// Hold the current buyer between its check and its act.
///
/// Loom cannot sleep, so under Loom the window is a scheduling point instead.
#[cfg(harness_loom)]
pub(crate) fn race_window_pause(_window: Duration) {
    loom::thread::yield_now();
}

/// Hold the current buyer between its check and its act.
#[cfg(not(harness_loom))]
pub(crate) fn race_window_pause(window: Duration) {
    if window.is_zero() {
        std::thread::yield_now();
    } else {
        std::thread::sleep(window);
    }
}
