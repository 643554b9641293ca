//! Shared ticket pool with an unguarded and a guarded acquire path.
//!
//! Both paths run the same sequence: read `available`, give up unless it is positive, wait
//! out the race window, then decrement. The unguarded path runs those steps with no
//! coordination at all, so concurrent buyers that all saw the last ticket all sell it. The
//! guarded path holds one pool-wide lock across the whole sequence.
//!
//! `available` is an atomic only so that unsynchronized access is defined behavior. The
//! unguarded path touches it with separate `Relaxed` loads and stores: no fences, no
//! `fetch_sub`, and the decrement is a fresh read followed by a blind write.

use std::sync::PoisonError;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::types::{AcquireAttempt, GuardMode};
use crate::error::{HarnessError, HarnessResult};
use crate::sync::{AtomicI64, Mutex, race_window_pause};

/// Default delay between a buyer's check and its decrement.
pub const DEFAULT_RACE_WINDOW: Duration = Duration::from_millis(5);

/// Pool of indivisible tickets contended by concurrent buyers.
///
/// [`reset`](Self::reset) takes `&mut self`, so a reset can never overlap a run that is still
/// borrowing the pool.
#[derive(Debug)]
pub struct TicketPool {
    available: AtomicI64,
    initialized: bool,
    race_window: Duration,
    checkout: Mutex<()>,
    log: Mutex<Vec<AcquireAttempt>>,
}

impl Default for TicketPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketPool {
    /// Pool that must be reset before first use.
    pub fn new() -> Self {
        Self::with_race_window(DEFAULT_RACE_WINDOW)
    }

    /// Pool with a custom check-to-act delay. A zero window still yields the thread.
    pub fn with_race_window(race_window: Duration) -> Self {
        Self {
            available: AtomicI64::new(0),
            initialized: false,
            race_window,
            checkout: Mutex::new(()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Check-to-act delay.
    pub fn race_window(&self) -> Duration {
        self.race_window
    }

    /// Refill the pool to `initial_count` tickets and clear the attempt log.
    pub fn reset(&mut self, initial_count: u32) {
        self.available = AtomicI64::new(i64::from(initial_count));
        self.log = Mutex::new(Vec::new());
        self.initialized = true;
        tracing::debug!(initial_count, "ticket pool reset");
    }

    /// Whether the pool has been reset at least once.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.initialized
    }

    /// Tickets currently left. Negative after an oversell.
    pub fn available(&self) -> i64 {
        self.available.load(Ordering::SeqCst)
    }

    /// Snapshot of the attempt log in append order.
    pub fn log(&self) -> Vec<AcquireAttempt> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Acquire a ticket under `mode`.
    pub fn acquire(&self, buyer_id: usize, mode: GuardMode) -> HarnessResult<AcquireAttempt> {
        match mode {
            GuardMode::Unguarded => self.acquire_unguarded(buyer_id),
            GuardMode::Guarded => self.acquire_guarded(buyer_id),
        }
    }

    /// Check then act with no mutual exclusion. Concurrent callers can oversell.
    pub fn acquire_unguarded(&self, buyer_id: usize) -> HarnessResult<AcquireAttempt> {
        self.ensure_reset()?;
        let (observed, succeeded, resulting) = self.check_then_act();
        Ok(self.append(buyer_id, GuardMode::Unguarded, observed, succeeded, resulting))
    }

    /// Check then act while holding the pool lock, so at most one buyer is mid-sequence.
    pub fn acquire_guarded(&self, buyer_id: usize) -> HarnessResult<AcquireAttempt> {
        self.ensure_reset()?;
        let _checkout = self
            .checkout
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (observed, succeeded, resulting) = self.check_then_act();
        Ok(self.append(buyer_id, GuardMode::Guarded, observed, succeeded, resulting))
    }

    fn ensure_reset(&self) -> HarnessResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(HarnessError::InvalidState(
                "ticket pool used before reset".to_string(),
            ))
        }
    }

    /// Returns `(observed, succeeded, resulting)`.
    fn check_then_act(&self) -> (i64, bool, i64) {
        let observed = self.available.load(Ordering::Relaxed);
        if observed <= 0 {
            return (observed, false, observed);
        }

        race_window_pause(self.race_window);

        let current = self.available.load(Ordering::Relaxed);
        let resulting = current - 1;
        self.available.store(resulting, Ordering::Relaxed);
        (observed, true, resulting)
    }

    fn append(
        &self,
        buyer_id: usize,
        mode: GuardMode,
        observed_available: i64,
        succeeded: bool,
        resulting_available: i64,
    ) -> AcquireAttempt {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let attempt = AcquireAttempt {
            sequence: log.len(),
            buyer_id,
            mode,
            observed_available,
            succeeded,
            resulting_available,
        };
        tracing::debug!(
            buyer_id,
            %mode,
            observed_available,
            succeeded,
            resulting_available,
            "acquire attempt"
        );
        log.push(attempt.clone());
        attempt
    }
}
