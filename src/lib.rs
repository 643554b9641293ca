//! # contention-harness
//!
//! In-process harness for comparing scheduling strategies and demonstrating a check-then-act
//! race:
//! - `workload`: run `N` uniform items under sequential, cooperative, fan-out and worker-pool
//!   scheduling, with per-item completion events and total elapsed time
//! - `contention`: a shared ticket pool bought from by concurrent threads, unguarded or under
//!   a pool-wide lock
//! - `progress`: the sink capability that receives status lines
//! - `law`: reusable assertions over results and outcomes
//! - `generators`: proptest strategies for harness parameters (feature `generators`)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod config;
pub mod contention;
pub mod error;
pub mod law;
pub mod prelude;
pub mod progress;
mod sync;
pub mod workload;

#[cfg(feature = "generators")]
#[cfg_attr(docsrs, doc(cfg(feature = "generators")))]
pub mod generators;

pub use config::HarnessConfig;
pub use contention::{AcquireAttempt, GuardMode, SimulationOutcome, TicketPool, TrialSummary};
pub use error::{HarnessError, HarnessResult};
pub use progress::{CollectingSink, NullSink, ProgressSink, SharedSink, TracingSink};
pub use workload::{
    CancellationFlag, ExecutionEvent, ExecutionResult, Strategy, WorkItem, WorkerId,
    WorkloadExecutor, WorkloadParams, measure_responsiveness,
};
