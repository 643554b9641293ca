//! Elapsed-time laws.

use std::time::Duration;

use crate::workload::{ExecutionResult, Strategy};

/// Assert `observed` lies in `[expected, expected + jitter]`.
///
/// Runs never finish early: every strategy waits out at least one full cost chain.
pub fn assert_elapsed_near(observed: Duration, expected: Duration, jitter: Duration) {
    assert!(
        observed >= expected,
        "run finished early (elapsed={observed:?}, expected={expected:?})"
    );
    assert!(
        observed <= expected + jitter,
        "run exceeded allowed jitter \
         (elapsed={observed:?}, expected={expected:?}, jitter={jitter:?})"
    );
}

/// Number of costs that may overlap for `strategy`.
#[must_use]
pub fn overlap_lanes(strategy: Strategy, item_count: usize, parallelism: usize) -> usize {
    match strategy {
        Strategy::Sequential | Strategy::Cooperative => 1,
        Strategy::ConcurrentFanout => item_count,
        Strategy::ParallelWorkerPool => parallelism,
    }
}

/// Elapsed time a run's strategy predicts: `N·D`, `D` or `ceil(N/P)·D`.
#[must_use]
pub fn expected_elapsed(result: &ExecutionResult, parallelism: usize) -> Duration {
    result
        .params()
        .ideal_elapsed(overlap_lanes(result.strategy, result.item_count, parallelism))
}

/// Assert a run took the time its strategy predicts.
pub fn assert_strategy_elapsed(result: &ExecutionResult, parallelism: usize, jitter: Duration) {
    assert_elapsed_near(result.elapsed, expected_elapsed(result, parallelism), jitter);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(strategy: Strategy, elapsed_ms: u64) -> ExecutionResult {
        ExecutionResult {
            strategy,
            item_count: 5,
            unit_cost: Duration::from_millis(100),
            elapsed: Duration::from_millis(elapsed_ms),
            events: Vec::new(),
        }
    }

    #[test]
    fn strategies_predict_their_own_elapsed() {
        let jitter = Duration::from_millis(20);
        assert_strategy_elapsed(&result(Strategy::Sequential, 505), 1, jitter);
        assert_strategy_elapsed(&result(Strategy::Cooperative, 500), 1, jitter);
        assert_strategy_elapsed(&result(Strategy::ConcurrentFanout, 110), 1, jitter);
        assert_strategy_elapsed(&result(Strategy::ParallelWorkerPool, 302), 2, jitter);
    }

    #[test]
    #[should_panic(expected = "finished early")]
    fn early_finish_is_rejected() {
        assert_elapsed_near(
            Duration::from_millis(90),
            Duration::from_millis(100),
            Duration::from_millis(50),
        );
    }

    #[test]
    #[should_panic(expected = "exceeded allowed jitter")]
    fn slow_finish_is_rejected() {
        assert_strategy_elapsed(
            &result(Strategy::ConcurrentFanout, 400),
            1,
            Duration::from_millis(50),
        );
    }
}
