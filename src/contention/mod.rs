//! Check-then-act race on a shared ticket pool, with and without mutual exclusion.

pub mod pool;
pub mod simulate;
pub mod types;

pub use pool::{DEFAULT_RACE_WINDOW, TicketPool};
pub use types::{AcquireAttempt, GuardMode, SimulationOutcome, TrialSummary};
