//! Proptest strategies for harness parameters.

use std::time::Duration;

use proptest::prelude::*;

use crate::workload::{Strategy as Scheduling, WorkloadParams};

/// Workloads of `1..=max_items` items costing `0..=max_cost_ms` milliseconds each.
pub fn small_workload(max_items: usize, max_cost_ms: u64) -> impl Strategy<Value = WorkloadParams> {
    assert!(max_items > 0, "max_items must be > 0");
    (1..=max_items, 0..=max_cost_ms).prop_filter_map("valid workload", |(items, cost_ms)| {
        WorkloadParams::new(items, Duration::from_millis(cost_ms)).ok()
    })
}

/// Worker-pool bounds in `1..=max`.
pub fn pool_parallelism(max: usize) -> impl Strategy<Value = usize> {
    assert!(max > 0, "max must be > 0");
    1..=max
}

/// Buyer counts in `1..=max`.
pub fn buyer_counts(max: usize) -> impl Strategy<Value = usize> {
    assert!(max > 0, "max must be > 0");
    1..=max
}

/// Any scheduling strategy.
pub fn scheduling_strategy() -> impl Strategy<Value = Scheduling> {
    prop::sample::select(Scheduling::ALL.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn workloads_stay_in_bounds(params in small_workload(12, 3)) {
            prop_assert!((1..=12).contains(&params.item_count()));
            prop_assert!(params.unit_cost() <= Duration::from_millis(3));
        }

        #[test]
        fn bounds_are_positive(p in pool_parallelism(8), b in buyer_counts(16)) {
            prop_assert!((1..=8).contains(&p));
            prop_assert!((1..=16).contains(&b));
        }
    }
}
