//! Heartbeat probe that shows whether a strategy leaves its thread free for other work.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::executor::WorkloadExecutor;
use super::types::{ExecutionResult, Strategy, WorkloadParams};
use crate::error::{HarnessError, HarnessResult};
use crate::progress::SharedSink;

/// Heartbeats observed while a workload shared a single thread with a ticker task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsivenessReport {
    /// Strategy under observation.
    pub strategy: Strategy,
    /// Heartbeat interval.
    pub tick: Duration,
    /// Heartbeats that ran before the workload returned.
    pub ticks: usize,
    /// The workload run itself.
    pub result: ExecutionResult,
}

/// Run `strategy` on a fresh current-thread runtime next to a heartbeat task.
///
/// A blocking strategy never lets the heartbeat run, so it reports zero ticks; a suspending
/// one reports roughly `elapsed / tick`. Only `Sequential` and `Cooperative` are accepted.
/// Must not be called from inside an async context.
pub fn measure_responsiveness(
    strategy: Strategy,
    params: WorkloadParams,
    tick: Duration,
    sink: SharedSink,
) -> HarnessResult<ResponsivenessReport> {
    if !matches!(strategy, Strategy::Sequential | Strategy::Cooperative) {
        return Err(HarnessError::invalid_parameter(
            "strategy",
            format!("{strategy} is not a single-context strategy"),
        ));
    }
    if tick.is_zero() {
        return Err(HarnessError::invalid_parameter("tick", "must be non-zero"));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let beats = Arc::new(AtomicUsize::new(0));
        let heartbeat = tokio::spawn({
            let beats = Arc::clone(&beats);
            async move {
                let mut interval =
                    tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
                loop {
                    interval.tick().await;
                    beats.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let executor = WorkloadExecutor::new();
        let outcome = match strategy {
            Strategy::Cooperative => executor.run_cooperative(params, sink).await,
            _ => executor.run_sequential(params, sink),
        };
        let ticks = beats.load(Ordering::SeqCst);
        heartbeat.abort();

        outcome.map(|result| {
            tracing::info!(%strategy, ticks, "responsiveness measured");
            ResponsivenessReport {
                strategy,
                tick,
                ticks,
                result,
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;

    fn params() -> WorkloadParams {
        WorkloadParams::new(4, Duration::from_millis(20)).expect("valid params")
    }

    #[test]
    fn blocking_run_starves_the_heartbeat() {
        let report = measure_responsiveness(
            Strategy::Sequential,
            params(),
            Duration::from_millis(2),
            Arc::new(NullSink),
        )
        .expect("sequential probe");
        assert_eq!(report.ticks, 0);
        assert_eq!(report.result.events.len(), 4);
    }

    #[test]
    fn suspending_run_lets_the_heartbeat_through() {
        let report = measure_responsiveness(
            Strategy::Cooperative,
            params(),
            Duration::from_millis(2),
            Arc::new(NullSink),
        )
        .expect("cooperative probe");
        assert!(report.ticks > 0, "heartbeat never ran");
        assert_eq!(report.result.item_order(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn multi_context_strategies_are_rejected() {
        for strategy in [Strategy::ConcurrentFanout, Strategy::ParallelWorkerPool] {
            let err = measure_responsiveness(
                strategy,
                params(),
                Duration::from_millis(1),
                Arc::new(NullSink),
            )
            .unwrap_err();
            assert!(err.is_contract_violation());
        }
    }
}
