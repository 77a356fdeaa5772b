//! Sluice scheduler - the control plane
//!
//! The scheduler owns the authoritative assignment of bindings to
//! adapters and holds no log data itself. Every poll interval it fetches
//! the binding universe from the platform catalog, filters it, and
//! reconciles it against what each adapter reports, creating and deleting
//! bindings until every desired binding runs on `min(replication,
//! adapters)` adapters.
//!
//! Module map:
//!
//! - [`ingress`] - catalog API client, binding fetcher, version and
//!   blacklist filters
//! - [`egress`] - adapter pool, RPC wrapper, and the reconciling
//!   orchestrator
//! - [`health`] - HTTP health endpoint with assignment counts
//! - [`app`] - process wiring for the `sluice-scheduler` binary

pub mod app;
pub mod egress;
pub mod health;
pub mod ingress;
