//! Reusable assertions over workload results and contention outcomes.
//!
//! Each helper panics with a descriptive message, so they drop straight into `#[test]`
//! functions and proptest bodies.

pub mod contention;
pub mod ordering;
pub mod timing;
