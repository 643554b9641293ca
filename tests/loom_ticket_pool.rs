#![cfg(harness_loom)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use loom::sync::Arc;
use loom::thread;

use contention_harness::{GuardMode, TicketPool};

fn race(mode: GuardMode) -> (usize, i64) {
    let mut pool = TicketPool::with_race_window(Duration::ZERO);
    pool.reset(1);
    let pool = Arc::new(pool);

    let buyers: Vec<_> = (1..=2)
        .map(|buyer| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.acquire(buyer, mode).expect("pool was reset"))
        })
        .collect();

    let successes = buyers
        .into_iter()
        .map(|buyer| buyer.join().expect("buyer should join"))
        .filter(|attempt| attempt.succeeded)
        .count();
    (successes, pool.available())
}

#[test]
fn guarded_pool_admits_one_buyer_in_every_interleaving() {
    loom::model(|| {
        let (successes, available) = race(GuardMode::Guarded);
        assert_eq!(successes, 1);
        assert_eq!(available, 0);
    });
}

#[test]
fn unguarded_pool_has_an_overselling_interleaving() {
    static OVERSOLD: AtomicBool = AtomicBool::new(false);
    loom::model(|| {
        let (successes, available) = race(GuardMode::Unguarded);
        assert!(successes >= 1);
        assert!(available >= -1);
        if available < 0 {
            OVERSOLD.store(true, Ordering::SeqCst);
        }
    });
    assert!(OVERSOLD.load(Ordering::SeqCst));
}
