//! Adapter egress
//!
//! [`adapter_pool`] holds one mutual-TLS channel per adapter in
//! configuration order; [`adapter_service`] wraps the three control RPCs
//! with per-call timeouts and failure isolation; [`orchestrator`] runs
//! the periodic desired-versus-actual reconcile.

pub mod adapter_pool;
pub mod adapter_service;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testutil;

pub use adapter_pool::{AdapterPool, AdapterPoolError};
pub use adapter_service::AdapterService;
pub use orchestrator::Orchestrator;
