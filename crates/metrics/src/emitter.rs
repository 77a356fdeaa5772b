//! Metric emission seam
//!
//! Components increment named counters through `MetricEmitter` without
//! knowing where the numbers go. Production wiring uses `TracingEmitter`;
//! the platform metric envelope transport lives outside this system.

/// Sink for counter increments.
pub trait MetricEmitter: Send + Sync {
    /// Add `delta` to the counter identified by `name`
    fn inc_counter(&self, name: &str, delta: u64);
}

/// Emitter that reports counter deltas as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEmitter;

impl MetricEmitter for TracingEmitter {
    fn inc_counter(&self, name: &str, delta: u64) {
        if delta > 0 {
            tracing::debug!(counter = name, delta, "counter incremented");
        }
    }
}
