use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use contention_harness::law::ordering::{
    assert_item_permutation, assert_strategy_ordering, assert_strictly_increasing_items,
    assert_worker_bound,
};
use contention_harness::law::timing::{assert_elapsed_near, assert_strategy_elapsed};
use contention_harness::{
    CollectingSink, ExecutionResult, HarnessError, NullSink, ProgressSink, SharedSink, Strategy,
    WorkerId, WorkloadExecutor, WorkloadParams,
};

fn params(items: usize, cost_ms: u64) -> WorkloadParams {
    WorkloadParams::new(items, Duration::from_millis(cost_ms)).expect("valid params")
}

#[test]
fn sequential_five_by_500ms_blocks_for_the_sum() {
    let result = WorkloadExecutor::new()
        .run_sequential(params(5, 500), Arc::new(NullSink))
        .expect("sequential run");

    assert_elapsed_near(
        result.elapsed,
        Duration::from_millis(2500),
        Duration::from_millis(400),
    );
    assert_eq!(result.item_order(), vec![1, 2, 3, 4, 5]);
    assert!(result.events.iter().all(|e| e.worker == WorkerId::Caller));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn fanout_five_by_500ms_overlaps_to_one_cost() {
    let result = WorkloadExecutor::new()
        .run_concurrent_fanout(params(5, 500), Arc::new(NullSink))
        .await
        .expect("fan-out run");

    assert_elapsed_near(
        result.elapsed,
        Duration::from_millis(500),
        Duration::from_millis(50),
    );
    assert_item_permutation(&result);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn fanout_elapsed_does_not_grow_with_items() {
    let executor = WorkloadExecutor::new();
    for items in [1, 10, 200] {
        let result = executor
            .run_concurrent_fanout(params(items, 100), Arc::new(NullSink))
            .await
            .expect("fan-out run");
        assert_strategy_elapsed(&result, 1, Duration::from_millis(20));
        assert_item_permutation(&result);
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cooperative_keeps_order_and_sums_costs() {
    let result = WorkloadExecutor::new()
        .run_cooperative(params(6, 250), Arc::new(NullSink))
        .await
        .expect("cooperative run");

    assert_strictly_increasing_items(&result);
    assert_strategy_elapsed(&result, 1, Duration::from_millis(20));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cooperative_run_leaves_room_for_co_resident_tasks() {
    let beats = Arc::new(AtomicUsize::new(0));
    let heartbeat = tokio::spawn({
        let beats = Arc::clone(&beats);
        async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                beats.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    WorkloadExecutor::new()
        .run_cooperative(params(3, 100), Arc::new(NullSink))
        .await
        .expect("cooperative run");
    heartbeat.abort();

    assert!(beats.load(Ordering::SeqCst) >= 25);
}

#[test]
fn pool_runs_in_ceil_n_over_p_rounds() {
    let result = WorkloadExecutor::new()
        .run_parallel_pool(params(6, 60), 3, Arc::new(NullSink))
        .expect("pool run");

    assert_strategy_elapsed(&result, 3, Duration::from_millis(150));
    assert_item_permutation(&result);
    assert_worker_bound(&result, 3);
}

#[test]
fn pool_larger_than_workload_spawns_one_worker_per_item() {
    let result = WorkloadExecutor::new()
        .run_parallel_pool(params(2, 20), 16, Arc::new(NullSink))
        .expect("pool run");

    assert_worker_bound(&result, 2);
    assert_strategy_elapsed(&result, 16, Duration::from_millis(100));
}

/// Sink that counts calls entered while another call was still running.
#[derive(Default)]
struct OverlapDetector {
    inside: AtomicUsize,
    overlaps: AtomicUsize,
    lines: CollectingSink,
}

impl ProgressSink for OverlapDetector {
    fn report(&self, line: &str) {
        if self.inside.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_millis(1));
        self.lines.report(line);
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }
}

impl OverlapDetector {
    fn assert_serialized_in_event_order(&self, result: &ExecutionResult) {
        assert_eq!(self.overlaps.load(Ordering::SeqCst), 0, "sink calls overlapped");
        let lines = self.lines.lines();
        assert_eq!(lines.len(), result.item_count + 2);
        for (event, line) in result.events.iter().zip(&lines[1..]) {
            let expected = format!("item {} done on {}", event.item_index, event.worker);
            assert!(
                line.contains(&expected),
                "line `{line}` does not match event `{expected}`"
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fanout_sink_calls_are_serialized_and_match_events() {
    let detector = Arc::new(OverlapDetector::default());
    let sink: SharedSink = detector.clone();

    let result = WorkloadExecutor::new()
        .run_concurrent_fanout(params(16, 5), sink)
        .await
        .expect("fan-out run");

    detector.assert_serialized_in_event_order(&result);
}

#[test]
fn pool_sink_calls_are_serialized_and_match_events() {
    let detector = Arc::new(OverlapDetector::default());
    let sink: SharedSink = detector.clone();

    let result = WorkloadExecutor::new()
        .run_parallel_pool(params(16, 5), 4, sink)
        .expect("pool run");

    assert_worker_bound(&result, 4);
    detector.assert_serialized_in_event_order(&result);
}

#[tokio::test(flavor = "current_thread")]
async fn run_dispatches_every_strategy() {
    let executor = WorkloadExecutor::new();
    for strategy in Strategy::ALL {
        let result = executor
            .run(strategy, params(4, 1), 2, Arc::new(NullSink))
            .await
            .expect("dispatched run");
        assert_eq!(result.strategy, strategy);
        assert_strategy_ordering(&result);
        let seen: BTreeSet<_> = result.item_order().into_iter().collect();
        assert_eq!(seen.len(), 4);
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn fanout_cancellation_reports_distinct_outcome() {
    let executor = WorkloadExecutor::new();
    let flag = executor.cancellation().clone();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        flag.cancel();
    });

    let err = executor
        .run_concurrent_fanout(params(8, 100), Arc::new(NullSink))
        .await
        .unwrap_err();
    canceller.await.expect("canceller task");

    assert!(matches!(err, HarnessError::Cancelled { completed: 0 }));
    assert!(!err.is_contract_violation());
}
