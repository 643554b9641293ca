//! Ticket pool laws.

use crate::contention::{SimulationOutcome, TicketPool, TrialSummary};

/// Assert a one-ticket run sold exactly one ticket and left the pool at zero.
pub fn assert_single_winner(outcome: &SimulationOutcome) {
    assert_eq!(
        outcome.success_count, 1,
        "{} run sold {} ticket(s) from a pool of one",
        outcome.mode, outcome.success_count
    );
    assert_eq!(
        outcome.fail_count,
        outcome.buyer_count - 1,
        "{} run failed {} buyer(s), expected {}",
        outcome.mode,
        outcome.fail_count,
        outcome.buyer_count - 1
    );
    assert_eq!(
        outcome.final_available, 0,
        "{} run left {} ticket(s)",
        outcome.mode, outcome.final_available
    );
}

/// Assert every buyer is accounted for and the log is contiguous.
pub fn assert_attempts_accounted(outcome: &SimulationOutcome) {
    assert_eq!(
        outcome.success_count + outcome.fail_count,
        outcome.buyer_count,
        "outcome lost buyers (success={}, fail={}, buyers={})",
        outcome.success_count,
        outcome.fail_count,
        outcome.buyer_count
    );
    assert_eq!(
        outcome.log.len(),
        outcome.buyer_count,
        "log holds {} attempt(s) for {} buyer(s)",
        outcome.log.len(),
        outcome.buyer_count
    );
    for (position, attempt) in outcome.log.iter().enumerate() {
        assert_eq!(
            attempt.sequence, position,
            "log entry at {position} carries sequence {}",
            attempt.sequence
        );
    }
}

/// Assert the oversell never exceeds what the buyers could have taken.
pub fn assert_deficit_bounded(outcome: &SimulationOutcome) {
    let max_deficit = outcome.buyer_count.saturating_sub(1) as u64;
    assert!(
        outcome.deficit() <= max_deficit,
        "deficit {} exceeds buyers - 1 = {max_deficit}",
        outcome.deficit()
    );
}

/// Assert at least one trial oversold.
pub fn assert_oversell_observed(summary: &TrialSummary) {
    assert!(
        summary.oversold_trials > 0,
        "{} buyers never oversold across {} {} trial(s)",
        summary.buyer_count,
        summary.trials,
        summary.mode
    );
}

/// Assert no trial oversold.
pub fn assert_never_oversold(summary: &TrialSummary) {
    assert_eq!(
        summary.oversold_trials, 0,
        "{} of {} {} trial(s) oversold (worst final={})",
        summary.oversold_trials, summary.trials, summary.mode, summary.worst_final_available
    );
}

/// Assert repeated resets always leave exactly `initial_count` tickets and an empty log.
pub fn assert_reset_idempotent(pool: &mut TicketPool, initial_count: u32, repeats: usize) {
    for _ in 0..repeats.max(1) {
        pool.reset(initial_count);
    }
    assert_eq!(
        pool.available(),
        i64::from(initial_count),
        "reset left {} ticket(s), expected {initial_count}",
        pool.available()
    );
    assert!(pool.log().is_empty(), "reset did not clear the attempt log");
}

#[cfg(all(test, not(harness_loom)))]
mod tests {
    use super::*;
    use crate::contention::{AcquireAttempt, GuardMode};

    fn outcome(success_count: usize, final_available: i64) -> SimulationOutcome {
        let buyer_count = 3;
        SimulationOutcome {
            mode: GuardMode::Guarded,
            buyer_count,
            success_count,
            fail_count: buyer_count - success_count,
            final_available,
            log: (0..buyer_count)
                .map(|sequence| AcquireAttempt {
                    sequence,
                    buyer_id: sequence + 1,
                    mode: GuardMode::Guarded,
                    observed_available: 1,
                    succeeded: sequence < success_count,
                    resulting_available: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn healthy_outcome_passes_every_law() {
        let healthy = outcome(1, 0);
        assert_single_winner(&healthy);
        assert_attempts_accounted(&healthy);
        assert_deficit_bounded(&healthy);
    }

    #[test]
    #[should_panic(expected = "sold 2 ticket(s)")]
    fn double_sale_is_rejected() {
        assert_single_winner(&outcome(2, -1));
    }

    #[test]
    fn reset_law_holds_for_fresh_pool() {
        let mut pool = TicketPool::new();
        assert_reset_idempotent(&mut pool, 4, 3);
    }
}
