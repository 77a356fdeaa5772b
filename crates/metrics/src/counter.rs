//! Delta counter
//!
//! A counter that accumulates increments between emissions. Emission
//! consumes the accumulated delta; if sending fails the delta is restored
//! so the next attempt carries it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free delta counter.
///
/// All methods take `&self`; the counter is safe to share behind an `Arc`
/// across tasks.
#[derive(Debug, Default)]
pub struct CounterMetric {
    name: &'static str,
    delta: AtomicU64,
}

impl CounterMetric {
    /// Create a counter with the given metric name
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            delta: AtomicU64::new(0),
        }
    }

    /// Metric name this counter reports under
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Add to the accumulated delta
    #[inline]
    pub fn increment(&self, count: u64) {
        self.delta.fetch_add(count, Ordering::Relaxed);
    }

    /// Current accumulated delta without consuming it
    #[inline]
    pub fn delta(&self) -> u64 {
        self.delta.load(Ordering::Relaxed)
    }

    /// Consume and return the accumulated delta
    #[inline]
    pub fn take(&self) -> u64 {
        self.delta.swap(0, Ordering::Relaxed)
    }

    /// Send the accumulated delta through `send`, restoring it on failure
    /// so no increments are lost across a flaky transport.
    pub fn send_with<E>(&self, send: impl FnOnce(u64) -> Result<(), E>) -> Result<(), E> {
        let delta = self.take();
        if let Err(e) = send(delta) {
            self.delta.fetch_add(delta, Ordering::Relaxed);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "counter_test.rs"]
mod counter_test;
