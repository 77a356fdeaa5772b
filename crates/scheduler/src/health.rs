//! Scheduler health endpoint
//!
//! `GET /health` reports the size of the world the scheduler is managing:
//! drains and bindings from the last completed fetch, and the configured
//! adapter pool size. The counters live here, owned by this module, and
//! are updated by the orchestrator after each pass - no component reaches
//! into another for them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

/// Counts surfaced by `/health`.
#[derive(Debug, Default)]
pub struct HealthStats {
    drain_count: AtomicUsize,
    binding_count: AtomicUsize,
    adapter_count: AtomicUsize,
}

impl HealthStats {
    /// Record the adapter pool size (static for the process lifetime)
    pub fn set_adapter_count(&self, count: usize) {
        self.adapter_count.store(count, Ordering::Relaxed);
    }

    /// Record the result of the latest fetch: distinct drain URLs and
    /// flattened binding tuples
    pub fn record_desired(&self, drain_count: usize, binding_count: usize) {
        self.drain_count.store(drain_count, Ordering::Relaxed);
        self.binding_count.store(binding_count, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            drain_count: self.drain_count.load(Ordering::Relaxed),
            adapter_count: self.adapter_count.load(Ordering::Relaxed),
            binding_count: self.binding_count.load(Ordering::Relaxed),
        }
    }
}

/// What `/health` serves.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthSnapshot {
    pub drain_count: usize,
    pub adapter_count: usize,
    pub binding_count: usize,
}

/// Build the health router over the shared counters.
pub fn router(stats: Arc<HealthStats>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(stats)
}

async fn health(State(stats): State<Arc<HealthStats>>) -> Json<HealthSnapshot> {
    Json(stats.snapshot())
}

#[cfg(test)]
#[path = "health_test.rs"]
mod health_test;
