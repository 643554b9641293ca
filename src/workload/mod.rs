//! Workload execution under interchangeable scheduling strategies.

pub mod cancel;
pub mod executor;
pub mod responsiveness;
pub mod types;

pub use cancel::CancellationFlag;
pub use executor::WorkloadExecutor;
pub use responsiveness::{ResponsivenessReport, measure_responsiveness};
pub use types::{ExecutionEvent, ExecutionResult, Strategy, WorkItem, WorkerId, WorkloadParams};
