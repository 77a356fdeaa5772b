//! Sluice adapter - the data plane
//!
//! An adapter receives binding assignments from the scheduler over gRPC
//! and runs one forwarding subscription per binding: a stream from the
//! platform log bus into an RFC 5424 drain writer. Slow drains cost
//! dropped envelopes, never ingress backpressure.
//!
//! Module map:
//!
//! - [`ingress`] - log-bus client pool and the per-binding subscription
//!   worker
//! - [`bindings`] - the subscription registry and the gRPC service the
//!   scheduler drives
//! - [`health`] - HTTP health endpoint
//! - [`app`] - process wiring for the `sluice-adapter` binary

pub mod app;
pub mod bindings;
pub mod health;
pub mod ingress;
