//! Sluice metrics
//!
//! Lock-free delta counters and the `MetricEmitter` seam components use to
//! report them. The platform's metric transport is not part of this
//! system; the default emitter records deltas through `tracing` so
//! operators still see the numbers, and tests swap in a capturing
//! emitter.
//!
//! # Design
//!
//! - Counters are plain `AtomicU64` deltas; `take()` swaps to zero so a
//!   periodic sender emits exactly what accumulated since the last send.
//! - Components hold `Arc<dyn MetricEmitter>` and never know what is
//!   behind it.

mod counter;
mod emitter;

pub use counter::CounterMetric;
pub use emitter::{MetricEmitter, TracingEmitter};
