//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use contention_harness::prelude::*;
//! ```

pub use crate::contention::{GuardMode, SimulationOutcome, TicketPool, TrialSummary};
pub use crate::error::{HarnessError, HarnessResult};
pub use crate::law::contention::{
    assert_attempts_accounted, assert_deficit_bounded, assert_never_oversold,
    assert_oversell_observed, assert_reset_idempotent, assert_single_winner,
};
pub use crate::law::ordering::{
    assert_item_permutation, assert_offsets_monotonic, assert_strategy_ordering,
    assert_strictly_increasing_items, assert_worker_bound,
};
pub use crate::law::timing::{assert_elapsed_near, assert_strategy_elapsed};
pub use crate::progress::{CollectingSink, NullSink, ProgressSink, SharedSink, TracingSink};
pub use crate::workload::{
    CancellationFlag, ExecutionResult, Strategy, WorkerId, WorkloadExecutor, WorkloadParams,
};

#[cfg(feature = "generators")]
pub use crate::generators::{buyer_counts, pool_parallelism, scheduling_strategy, small_workload};
