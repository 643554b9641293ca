//! Progress sinks: the capability callers hand to the executor to receive status lines.
//!
//! The executor serializes delivery, so a sink is never invoked by two workers at the same
//! time. Sinks still have to be `Send + Sync` because fan-out and pool runs call them from
//! whichever task or thread completed an item.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

/// Receives human-readable status lines.
pub trait ProgressSink: Send + Sync {
    /// Deliver one status line.
    fn report(&self, line: &str);
}

/// Shared handle to a progress sink, as accepted by executor entry points.
pub type SharedSink = Arc<dyn ProgressSink>;

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, line: &str) {
        self(line);
    }
}

/// Forwards every line to a single consumer. Lines sent after the receiver is dropped are lost.
impl ProgressSink for UnboundedSender<String> {
    fn report(&self, line: &str) {
        let _ = self.send(line.to_owned());
    }
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _line: &str) {}
}

/// Emits every line as a `tracing` info event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, line: &str) {
        tracing::info!(target: "contention_harness::progress", "{line}");
    }
}

/// Keeps every line in memory, in delivery order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    lines: Mutex<Vec<String>>,
}

impl CollectingSink {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines delivered so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for CollectingSink {
    fn report(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
    }
}
