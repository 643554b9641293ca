//! Harness run configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contention::DEFAULT_RACE_WINDOW;
use crate::error::HarnessResult;
use crate::workload::WorkloadParams;

const DEFAULT_ITEM_COUNT: usize = 5;
const DEFAULT_UNIT_COST: Duration = Duration::from_millis(500);
const DEFAULT_BUYER_COUNT: usize = 10;
const DEFAULT_TRIALS: usize = 50;

/// Parameters shared by the CLI and library callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Number of work items per run.
    pub item_count: usize,
    /// Simulated cost of each work item.
    pub unit_cost: Duration,
    /// Worker bound for the parallel pool strategy.
    pub parallelism: usize,
    /// Concurrent buyers per contention trial.
    pub buyer_count: usize,
    /// Artificial delay between check and act on the ticket pool.
    pub race_window: Duration,
    /// Number of contention trials to aggregate.
    pub trials: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self {
            item_count: DEFAULT_ITEM_COUNT,
            unit_cost: DEFAULT_UNIT_COST,
            parallelism,
            buyer_count: DEFAULT_BUYER_COUNT,
            race_window: DEFAULT_RACE_WINDOW,
            trials: DEFAULT_TRIALS,
        }
    }
}

impl HarnessConfig {
    /// Set the number of work items.
    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.item_count = item_count;
        self
    }

    /// Set the per-item simulated cost.
    pub fn with_unit_cost(mut self, unit_cost: Duration) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    /// Set the worker-pool bound.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the number of concurrent buyers.
    pub fn with_buyer_count(mut self, buyer_count: usize) -> Self {
        self.buyer_count = buyer_count;
        self
    }

    /// Set the check-to-act delay on the ticket pool.
    pub fn with_race_window(mut self, race_window: Duration) -> Self {
        self.race_window = race_window;
        self
    }

    /// Set the trial count.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Validate and convert the workload part of the configuration.
    pub fn workload_params(&self) -> HarnessResult<WorkloadParams> {
        WorkloadParams::new(self.item_count, self.unit_cost)
    }
}
