//! Adapter health endpoint
//!
//! `GET /health` reports how many bindings this adapter is forwarding.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::bindings::BindingManager;

#[derive(Debug, Serialize)]
struct HealthResponse {
    drain_count: usize,
}

/// Build the health router over the binding registry.
pub fn router(manager: Arc<BindingManager>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(manager)
}

async fn health(State(manager): State<Arc<BindingManager>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        drain_count: manager.binding_count(),
    })
}

#[cfg(test)]
#[path = "health_test.rs"]
mod health_test;
