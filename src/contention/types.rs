//! Records produced by the contention simulator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Synchronization policy for an acquire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    /// Read, delay and decrement run with no mutual exclusion.
    Unguarded,
    /// The whole read-check-delay-decrement sequence holds the pool lock.
    Guarded,
}

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unguarded => f.write_str("unguarded"),
            Self::Guarded => f.write_str("guarded"),
        }
    }
}

/// One buyer's attempt, as appended to the pool log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquireAttempt {
    /// Position in the pool log.
    pub sequence: usize,
    /// Buyer that made the attempt.
    pub buyer_id: usize,
    /// Policy the attempt ran under.
    pub mode: GuardMode,
    /// Tickets the buyer saw at its check.
    pub observed_available: i64,
    /// Whether the buyer took a ticket.
    pub succeeded: bool,
    /// Tickets left right after this attempt.
    pub resulting_available: i64,
}

impl fmt::Display for AcquireAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            write!(
                f,
                "#{} buyer {} ({}) saw {} and bought a ticket, {} left",
                self.sequence,
                self.buyer_id,
                self.mode,
                self.observed_available,
                self.resulting_available
            )
        } else {
            write!(
                f,
                "#{} buyer {} ({}) saw {} and found it sold out",
                self.sequence, self.buyer_id, self.mode, self.observed_available
            )
        }
    }
}

/// Aggregate of one concurrent purchase run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Policy every buyer used.
    pub mode: GuardMode,
    /// Buyers launched.
    pub buyer_count: usize,
    /// Buyers that took a ticket.
    pub success_count: usize,
    /// Buyers that found the pool empty.
    pub fail_count: usize,
    /// Pool size after every buyer finished.
    pub final_available: i64,
    /// Attempts in log order.
    pub log: Vec<AcquireAttempt>,
}

impl SimulationOutcome {
    /// Whether more tickets were sold than existed.
    #[must_use]
    pub fn oversold(&self) -> bool {
        self.final_available < 0
    }

    /// Tickets sold beyond the pool size.
    #[must_use]
    pub fn deficit(&self) -> u64 {
        if self.final_available < 0 {
            self.final_available.unsigned_abs()
        } else {
            0
        }
    }
}

/// Aggregate over repeated purchase runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Policy every buyer used.
    pub mode: GuardMode,
    /// Buyers per trial.
    pub buyer_count: usize,
    /// Trials run.
    pub trials: usize,
    /// Trials that ended below zero.
    pub oversold_trials: usize,
    /// Lowest final pool size seen.
    pub worst_final_available: i64,
    /// Successful purchases summed over trials.
    pub total_successes: usize,
}
