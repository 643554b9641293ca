//! Error taxonomy shared by the workload executor and the contention simulator.

use thiserror::Error;

/// Convenience alias for harness results.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors surfaced by harness entry points.
///
/// Parameter and state errors are caller bugs: they are reported before any work is scheduled
/// and are never retried internally.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A count or bound was outside its accepted range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as seen by the caller.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// An operation ran against state that was never prepared.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The run observed a raised cancellation flag and stopped early.
    #[error("run cancelled after {completed} completed item(s)")]
    Cancelled {
        /// Items completed before the flag was observed.
        completed: usize,
    },
    /// The OS refused a resource the run needs: the async runtime or a worker or buyer thread.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl HarnessError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for caller contract violations (parameter or state errors).
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. } | Self::InvalidState(_))
    }
}
