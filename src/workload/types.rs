//! Data model for workload runs.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// Scheduling strategy used for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One item at a time, blocking the caller for each cost.
    Sequential,
    /// One item at a time, suspending at each cost.
    Cooperative,
    /// Every item launched at once as a suspending task.
    ConcurrentFanout,
    /// Items shared by a bounded set of blocking worker threads.
    ParallelWorkerPool,
}

impl Strategy {
    /// All strategies, in the order they are usually compared.
    pub const ALL: [Strategy; 4] = [
        Strategy::Sequential,
        Strategy::Cooperative,
        Strategy::ConcurrentFanout,
        Strategy::ParallelWorkerPool,
    ];

    /// Whether completion events are guaranteed to follow item order.
    #[must_use]
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Sequential | Self::Cooperative)
    }

    /// Whether the simulated cost releases the execution context.
    #[must_use]
    pub fn suspends(self) -> bool {
        matches!(self, Self::Cooperative | Self::ConcurrentFanout)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequential => "sequential",
            Self::Cooperative => "cooperative",
            Self::ConcurrentFanout => "fanout",
            Self::ParallelWorkerPool => "pool",
        };
        f.write_str(name)
    }
}

/// Execution context that completed an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum WorkerId {
    /// The calling context itself.
    Caller,
    /// A spawned task, numbered in spawn order starting at 1.
    Task(usize),
    /// A pool worker, numbered from 0.
    Pool(usize),
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caller => f.write_str("caller"),
            Self::Task(id) => write!(f, "task-{id}"),
            Self::Pool(id) => write!(f, "worker-{id}"),
        }
    }
}

/// One unit of simulated work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// 1-based item index.
    pub index: usize,
    /// Simulated cost.
    pub cost: Duration,
}

/// Validated workload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadParams {
    item_count: usize,
    unit_cost: Duration,
}

impl WorkloadParams {
    /// Build parameters, rejecting an empty workload.
    pub fn new(item_count: usize, unit_cost: Duration) -> HarnessResult<Self> {
        if item_count == 0 {
            return Err(HarnessError::invalid_parameter(
                "item_count",
                "must be at least 1",
            ));
        }
        Ok(Self {
            item_count,
            unit_cost,
        })
    }

    /// Number of items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Cost of each item.
    #[must_use]
    pub fn unit_cost(&self) -> Duration {
        self.unit_cost
    }

    /// Fresh items `1..=N`.
    pub fn items(&self) -> impl Iterator<Item = WorkItem> + use<> {
        let cost = self.unit_cost;
        (1..=self.item_count).map(move |index| WorkItem { index, cost })
    }

    /// Expected elapsed time when `lanes` items can overlap.
    #[must_use]
    pub fn ideal_elapsed(&self, lanes: usize) -> Duration {
        let lanes = lanes.max(1);
        let rounds = self.item_count.div_ceil(lanes);
        self.unit_cost * u32::try_from(rounds).unwrap_or(u32::MAX)
    }
}

/// Completion record for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// Index of the completed item.
    pub item_index: usize,
    /// Context that completed it.
    pub worker: WorkerId,
    /// Time since run start.
    pub offset: Duration,
}

/// Outcome of a completed workload run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Strategy that produced the run.
    pub strategy: Strategy,
    /// Number of items requested.
    pub item_count: usize,
    /// Cost of each item.
    pub unit_cost: Duration,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
    /// Completion events in completion order.
    pub events: Vec<ExecutionEvent>,
}

impl ExecutionResult {
    /// Shape of the workload that produced this run.
    pub fn params(&self) -> WorkloadParams {
        WorkloadParams {
            item_count: self.item_count,
            unit_cost: self.unit_cost,
        }
    }

    /// Item indices in completion order.
    pub fn item_order(&self) -> Vec<usize> {
        self.events.iter().map(|event| event.item_index).collect()
    }

    /// Number of distinct contexts that completed items.
    pub fn worker_count(&self) -> usize {
        self.events
            .iter()
            .map(|event| event.worker)
            .collect::<BTreeSet<_>>()
            .len()
    }
}
