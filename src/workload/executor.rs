//! Runs one workload under each scheduling strategy.
//!
//! Blocking strategies (`Sequential`, `ParallelWorkerPool`) occupy their execution context for
//! the whole simulated cost. Suspending strategies (`Cooperative`, `ConcurrentFanout`) await a
//! tokio timer instead, which hands the thread back to the scheduler until the cost elapses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;

use super::cancel::CancellationFlag;
use super::types::{ExecutionEvent, ExecutionResult, Strategy, WorkItem, WorkerId, WorkloadParams};
use crate::error::{HarnessError, HarnessResult};
use crate::progress::SharedSink;

/// Collects completion events and forwards progress lines.
///
/// The event append and the sink call happen under one lock, so sink delivery is serialized
/// and matches event order.
struct Recorder {
    strategy: Strategy,
    sink: SharedSink,
    events: Mutex<Vec<ExecutionEvent>>,
}

impl Recorder {
    fn start(strategy: Strategy, params: &WorkloadParams, sink: SharedSink) -> Self {
        sink.report(&format!(
            "{strategy} started: {} item(s) x {:?}",
            params.item_count(),
            params.unit_cost()
        ));
        Self {
            strategy,
            sink,
            events: Mutex::new(Vec::with_capacity(params.item_count())),
        }
    }

    /// `offset` is read under the lock, so offsets are monotonic in event order.
    fn record(&self, item: WorkItem, worker: WorkerId, offset: impl FnOnce() -> Duration) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = offset();
        events.push(ExecutionEvent {
            item_index: item.index,
            worker,
            offset,
        });
        tracing::debug!(
            strategy = %self.strategy,
            item = item.index,
            %worker,
            offset_ms = offset.as_millis() as u64,
            "item completed"
        );
        self.sink.report(&format!(
            "{}: item {} done on {worker} at {offset:?}",
            self.strategy, item.index
        ));
    }

    fn finish(&self, params: &WorkloadParams, elapsed: Duration) -> HarnessResult<ExecutionResult> {
        let events = {
            let mut recorded = self.events.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *recorded)
        };
        if events.len() < params.item_count() {
            tracing::info!(
                strategy = %self.strategy,
                completed = events.len(),
                requested = params.item_count(),
                "run cancelled"
            );
            self.sink.report(&format!(
                "{} cancelled after {} item(s)",
                self.strategy,
                events.len()
            ));
            return Err(HarnessError::Cancelled {
                completed: events.len(),
            });
        }

        tracing::info!(
            strategy = %self.strategy,
            items = events.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run finished"
        );
        self.sink.report(&format!("{} finished in {elapsed:?}", self.strategy));
        Ok(ExecutionResult {
            strategy: self.strategy,
            item_count: params.item_count(),
            unit_cost: params.unit_cost(),
            elapsed,
            events,
        })
    }
}

/// Entry point for workload runs. One instance may serve any number of sequential runs.
#[derive(Debug, Clone, Default)]
pub struct WorkloadExecutor {
    cancellation: CancellationFlag,
}

impl WorkloadExecutor {
    /// Executor with its own, never-raised cancellation flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that stops when `cancellation` is raised.
    pub fn with_cancellation(cancellation: CancellationFlag) -> Self {
        Self { cancellation }
    }

    /// The flag checked between items and after suspension points.
    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Process items in order on the calling thread, blocking for each cost.
    ///
    /// The caller cannot do anything else until the run returns; on an async runtime this
    /// stalls every task sharing the thread.
    pub fn run_sequential(
        &self,
        params: WorkloadParams,
        sink: SharedSink,
    ) -> HarnessResult<ExecutionResult> {
        let recorder = Recorder::start(Strategy::Sequential, &params, sink);
        let start = std::time::Instant::now();
        for item in params.items() {
            if self.cancellation.is_cancelled() {
                break;
            }
            std::thread::sleep(item.cost);
            recorder.record(item, WorkerId::Caller, || start.elapsed());
        }
        recorder.finish(&params, start.elapsed())
    }

    /// Process items in order, suspending at each cost so co-resident tasks keep running.
    pub async fn run_cooperative(
        &self,
        params: WorkloadParams,
        sink: SharedSink,
    ) -> HarnessResult<ExecutionResult> {
        let recorder = Recorder::start(Strategy::Cooperative, &params, sink);
        let start = tokio::time::Instant::now();
        for item in params.items() {
            if self.cancellation.is_cancelled() {
                break;
            }
            tokio::time::sleep(item.cost).await;
            if self.cancellation.is_cancelled() {
                break;
            }
            recorder.record(item, WorkerId::Caller, || start.elapsed());
        }
        recorder.finish(&params, start.elapsed())
    }

    /// Launch every item as its own task and wait for all of them.
    ///
    /// Tasks land on whatever runtime is current; on a current-thread runtime they interleave
    /// on one thread. A panicking item is re-raised only after every other item has been joined.
    pub async fn run_concurrent_fanout(
        &self,
        params: WorkloadParams,
        sink: SharedSink,
    ) -> HarnessResult<ExecutionResult> {
        let recorder = Arc::new(Recorder::start(Strategy::ConcurrentFanout, &params, sink));
        let start = tokio::time::Instant::now();

        let mut tasks = JoinSet::new();
        if !self.cancellation.is_cancelled() {
            for item in params.items() {
                let recorder = Arc::clone(&recorder);
                let cancellation = self.cancellation.clone();
                tasks.spawn(async move {
                    tokio::time::sleep(item.cost).await;
                    if !cancellation.is_cancelled() {
                        recorder.record(item, WorkerId::Task(item.index), || start.elapsed());
                    }
                });
            }
        }

        let mut panic = None;
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                if err.is_panic() && panic.is_none() {
                    panic = Some(err.into_panic());
                }
            }
        }
        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }

        recorder.finish(&params, start.elapsed())
    }

    /// Share the items among up to `parallelism` blocking worker threads.
    ///
    /// Workers pull the next unclaimed item from a shared cursor, so each item runs exactly
    /// once and faster workers take more of the queue.
    pub fn run_parallel_pool(
        &self,
        params: WorkloadParams,
        parallelism: usize,
        sink: SharedSink,
    ) -> HarnessResult<ExecutionResult> {
        if parallelism == 0 {
            return Err(HarnessError::invalid_parameter(
                "parallelism",
                "must be at least 1",
            ));
        }

        let recorder = Recorder::start(Strategy::ParallelWorkerPool, &params, sink);
        let items: Vec<WorkItem> = params.items().collect();
        let cursor = AtomicUsize::new(0);
        let workers = parallelism.min(items.len());
        let start = std::time::Instant::now();

        std::thread::scope(|scope| -> HarnessResult<()> {
            for worker in 0..workers {
                let (items, cursor, recorder) = (&items, &cursor, &recorder);
                let cancellation = &self.cancellation;
                std::thread::Builder::new()
                    .name(format!("pool-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        while !cancellation.is_cancelled() {
                            let slot = cursor.fetch_add(1, Ordering::Relaxed);
                            let Some(item) = items.get(slot) else {
                                break;
                            };
                            std::thread::sleep(item.cost);
                            recorder.record(*item, WorkerId::Pool(worker), || start.elapsed());
                        }
                    })?;
            }
            Ok(())
        })?;

        recorder.finish(&params, start.elapsed())
    }

    /// Dispatch to the entry point for `strategy`.
    ///
    /// `parallelism` only applies to the worker pool. Blocking strategies still block the
    /// thread polling this future.
    pub async fn run(
        &self,
        strategy: Strategy,
        params: WorkloadParams,
        parallelism: usize,
        sink: SharedSink,
    ) -> HarnessResult<ExecutionResult> {
        match strategy {
            Strategy::Sequential => self.run_sequential(params, sink),
            Strategy::Cooperative => self.run_cooperative(params, sink).await,
            Strategy::ConcurrentFanout => self.run_concurrent_fanout(params, sink).await,
            Strategy::ParallelWorkerPool => self.run_parallel_pool(params, parallelism, sink),
        }
    }
}
