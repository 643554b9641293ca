//! Concurrent purchase runs against a [`TicketPool`].

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use super::pool::TicketPool;
use super::types::{GuardMode, SimulationOutcome, TrialSummary};
use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Launch {
    Pending,
    Go,
    CalledOff,
}

/// Start line for buyer threads. Buyers park here until every buyer has been spawned.
struct StartGate {
    launch: Mutex<Launch>,
    changed: Condvar,
}

impl StartGate {
    fn new() -> Self {
        Self {
            launch: Mutex::new(Launch::Pending),
            changed: Condvar::new(),
        }
    }

    fn release(&self, launch: Launch) {
        *self.launch.lock().unwrap_or_else(PoisonError::into_inner) = launch;
        self.changed.notify_all();
    }

    /// Park until the launch is decided. Returns whether the buyer should go.
    fn wait(&self) -> bool {
        let launch = self.launch.lock().unwrap_or_else(PoisonError::into_inner);
        let launch = self
            .changed
            .wait_while(launch, |state| *state == Launch::Pending)
            .unwrap_or_else(PoisonError::into_inner);
        *launch == Launch::Go
    }
}

impl TicketPool {
    /// Reset the pool to one ticket and let `buyer_count` threads try to buy it at once.
    ///
    /// Buyers are released together once all of them are spawned, so their check-then-act
    /// windows overlap. Success and failure counts use their own atomic counters, independent
    /// of the pool lock. If the OS refuses a buyer thread, nobody buys and the spawn error is
    /// returned as [`HarnessError::Runtime`].
    pub fn simulate_concurrent_purchases(
        &mut self,
        buyer_count: usize,
        mode: GuardMode,
    ) -> HarnessResult<SimulationOutcome> {
        self.purchase_with_thread_budget(buyer_count, mode, usize::MAX)
    }

    /// Buyers past `thread_budget` fail to spawn as if the OS had run out of threads.
    pub(crate) fn purchase_with_thread_budget(
        &mut self,
        buyer_count: usize,
        mode: GuardMode,
        thread_budget: usize,
    ) -> HarnessResult<SimulationOutcome> {
        if buyer_count == 0 {
            return Err(HarnessError::invalid_parameter(
                "buyer_count",
                "must be at least 1",
            ));
        }

        self.reset(1);
        let pool = &*self;
        let successes = AtomicUsize::new(0);
        let failures = AtomicUsize::new(0);
        let gate = StartGate::new();

        std::thread::scope(|scope| -> HarnessResult<()> {
            let mut buyers = Vec::with_capacity(buyer_count);
            let mut spawn_error = None;
            for buyer_id in 1..=buyer_count {
                let (successes, failures, gate) = (&successes, &failures, &gate);
                let spawned = if buyer_id > thread_budget {
                    Err(io::Error::new(
                        io::ErrorKind::WouldBlock,
                        "buyer thread budget exhausted",
                    ))
                } else {
                    std::thread::Builder::new()
                        .name(format!("buyer-{buyer_id}"))
                        .spawn_scoped(scope, move || -> HarnessResult<()> {
                            if !gate.wait() {
                                return Ok(());
                            }
                            let attempt = pool.acquire(buyer_id, mode)?;
                            let counter = if attempt.succeeded { successes } else { failures };
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                };
                match spawned {
                    Ok(buyer) => buyers.push(buyer),
                    Err(err) => {
                        tracing::warn!(buyer_id, buyer_count, %err, "buyer thread refused");
                        spawn_error = Some(err);
                        break;
                    }
                }
            }

            gate.release(if spawn_error.is_none() {
                Launch::Go
            } else {
                Launch::CalledOff
            });

            let mut first_error = spawn_error.map(HarnessError::from);
            for buyer in buyers {
                match buyer.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        first_error.get_or_insert(err);
                    }
                    Err(payload) => std::panic::resume_unwind(payload),
                }
            }
            first_error.map_or(Ok(()), Err)
        })?;

        let outcome = SimulationOutcome {
            mode,
            buyer_count,
            success_count: successes.load(Ordering::SeqCst),
            fail_count: failures.load(Ordering::SeqCst),
            final_available: self.available(),
            log: self.log(),
        };
        if outcome.oversold() {
            tracing::warn!(
                %mode,
                buyer_count,
                final_available = outcome.final_available,
                "ticket pool oversold"
            );
        } else {
            tracing::info!(
                %mode,
                buyer_count,
                success_count = outcome.success_count,
                "purchase run finished"
            );
        }
        Ok(outcome)
    }

    /// Repeat [`simulate_concurrent_purchases`](Self::simulate_concurrent_purchases) and
    /// aggregate how often and how badly the pool was oversold.
    pub fn run_trials(
        &mut self,
        buyer_count: usize,
        mode: GuardMode,
        trials: usize,
    ) -> HarnessResult<TrialSummary> {
        if trials == 0 {
            return Err(HarnessError::invalid_parameter("trials", "must be at least 1"));
        }

        let mut summary = TrialSummary {
            mode,
            buyer_count,
            trials,
            oversold_trials: 0,
            worst_final_available: i64::MAX,
            total_successes: 0,
        };
        for _ in 0..trials {
            let outcome = self.simulate_concurrent_purchases(buyer_count, mode)?;
            if outcome.oversold() {
                summary.oversold_trials += 1;
            }
            summary.worst_final_available =
                summary.worst_final_available.min(outcome.final_available);
            summary.total_successes += outcome.success_count;
        }
        Ok(summary)
    }
}

#[cfg(all(test, not(harness_loom)))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn guarded_run_sells_exactly_one_ticket() {
        let mut pool = TicketPool::with_race_window(Duration::from_millis(1));
        pool.reset(1);
        let outcome = pool
            .simulate_concurrent_purchases(10, GuardMode::Guarded)
            .expect("guarded run");

        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.fail_count, 9);
        assert_eq!(outcome.final_available, 0);
        assert_eq!(outcome.log.len(), 10);
        assert!(outcome.log.iter().all(|a| a.resulting_available >= 0));
    }

    #[test]
    fn single_buyer_never_oversells() {
        let mut pool = TicketPool::with_race_window(Duration::ZERO);
        for mode in [GuardMode::Unguarded, GuardMode::Guarded] {
            let outcome = pool
                .simulate_concurrent_purchases(1, mode)
                .expect("single buyer run");
            assert_eq!(outcome.success_count, 1);
            assert_eq!(outcome.fail_count, 0);
            assert_eq!(outcome.final_available, 0);
        }
    }

    #[test]
    fn zero_buyers_and_zero_trials_are_rejected() {
        let mut pool = TicketPool::new();
        assert!(matches!(
            pool.simulate_concurrent_purchases(0, GuardMode::Guarded),
            Err(HarnessError::InvalidParameter {
                name: "buyer_count",
                ..
            })
        ));
        assert!(matches!(
            pool.run_trials(2, GuardMode::Guarded, 0),
            Err(HarnessError::InvalidParameter { name: "trials", .. })
        ));
        assert!(!pool.is_reset());
    }

    #[test]
    fn refused_buyer_thread_calls_off_the_whole_launch() {
        let mut pool = TicketPool::with_race_window(Duration::ZERO);
        let err = pool
            .purchase_with_thread_budget(8, GuardMode::Guarded, 3)
            .unwrap_err();

        assert!(matches!(err, HarnessError::Runtime(_)));
        assert!(!err.is_contract_violation());
        assert_eq!(pool.available(), 1, "parked buyers must not buy");
        assert!(pool.log().is_empty());

        let outcome = pool
            .purchase_with_thread_budget(3, GuardMode::Guarded, 3)
            .expect("run within budget");
        assert_eq!(outcome.success_count, 1);
        assert_eq!(outcome.fail_count, 2);
    }

    #[test]
    fn unguarded_trials_eventually_oversell() {
        let mut pool = TicketPool::with_race_window(Duration::from_millis(5));
        let summary = pool
            .run_trials(8, GuardMode::Unguarded, 30)
            .expect("unguarded trials");

        assert!(summary.oversold_trials > 0, "no oversell in 30 trials");
        assert!(summary.worst_final_available < 0);
        assert!(summary.worst_final_available >= -7);
    }
}
