//! Event-count and completion-order laws.

use std::collections::BTreeSet;

use crate::workload::ExecutionResult;

/// Assert every item `1..=N` completed exactly once.
pub fn assert_item_permutation(result: &ExecutionResult) {
    assert_eq!(
        result.events.len(),
        result.item_count,
        "{} run emitted {} event(s) for {} item(s)",
        result.strategy,
        result.events.len(),
        result.item_count
    );
    let seen: BTreeSet<usize> = result.events.iter().map(|e| e.item_index).collect();
    assert_eq!(
        seen.len(),
        result.item_count,
        "{} run completed some item more than once",
        result.strategy
    );
    assert!(
        seen.iter().all(|index| (1..=result.item_count).contains(index)),
        "{} run completed an item outside 1..={}",
        result.strategy,
        result.item_count
    );
}

/// Assert events arrived in strictly increasing item order.
pub fn assert_strictly_increasing_items(result: &ExecutionResult) {
    for window in result.events.windows(2) {
        assert!(
            window[1].item_index > window[0].item_index,
            "{} run completed item {} after item {}",
            result.strategy,
            window[1].item_index,
            window[0].item_index
        );
    }
}

/// Assert event offsets never go backwards in completion order.
pub fn assert_offsets_monotonic(result: &ExecutionResult) {
    for window in result.events.windows(2) {
        assert!(
            window[1].offset >= window[0].offset,
            "{} run recorded offset {:?} after {:?}",
            result.strategy,
            window[1].offset,
            window[0].offset
        );
    }
}

/// Assert no more than `max_workers` distinct contexts completed items.
pub fn assert_worker_bound(result: &ExecutionResult, max_workers: usize) {
    let workers = result.worker_count();
    assert!(
        workers <= max_workers,
        "{} run used {workers} worker(s), bound is {max_workers}",
        result.strategy
    );
}

/// Apply the count law, plus the order law when the strategy promises ordering.
pub fn assert_strategy_ordering(result: &ExecutionResult) {
    assert_item_permutation(result);
    assert_offsets_monotonic(result);
    if result.strategy.is_ordered() {
        assert_strictly_increasing_items(result);
    }
}
