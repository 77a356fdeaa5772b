//! Adapter RPC wrapper
//!
//! Wraps the three control RPCs with a per-call timeout and per-adapter
//! failure isolation: a failed `ListBindings` yields an empty set and a
//! failed create/delete is logged, so one unreachable adapter never
//! blocks a reconcile pass. The next pass retries naturally.

use std::collections::HashSet;
use std::time::Duration;

use sluice_protocol::adapter::v1::{
    Binding, CreateBindingRequest, DeleteBindingRequest, ListBindingsRequest,
};
use tokio::time::timeout;

use super::adapter_pool::AdapterPool;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Control-RPC surface over the adapter pool.
pub struct AdapterService {
    pool: AdapterPool,
    rpc_timeout: Duration,
}

impl AdapterService {
    pub fn new(pool: AdapterPool) -> Self {
        Self {
            pool,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    /// Set the per-RPC timeout
    #[must_use]
    pub fn with_rpc_timeout(mut self, rpc_timeout: Duration) -> Self {
        self.rpc_timeout = rpc_timeout;
        self
    }

    /// Number of adapters in the pool
    pub fn adapter_count(&self) -> usize {
        self.pool.len()
    }

    /// Address of the adapter at `idx`
    pub fn addr(&self, idx: usize) -> &str {
        self.pool.addr(idx)
    }

    /// Bindings the adapter at `idx` reports. A failed or timed-out call
    /// is logged and treated as an empty set for this pass.
    pub async fn list_bindings(&self, idx: usize) -> HashSet<Binding> {
        let mut client = self.pool.client(idx);

        match timeout(self.rpc_timeout, client.list_bindings(ListBindingsRequest {})).await {
            Ok(Ok(response)) => response.into_inner().bindings.into_iter().collect(),
            Ok(Err(status)) => {
                tracing::warn!(
                    adapter = %self.pool.addr(idx),
                    error = %status,
                    "failed to list bindings, treating adapter as empty"
                );
                HashSet::new()
            }
            Err(_) => {
                tracing::warn!(
                    adapter = %self.pool.addr(idx),
                    "list bindings timed out, treating adapter as empty"
                );
                HashSet::new()
            }
        }
    }

    /// Ask the adapter at `idx` to start `binding`. Failures are logged;
    /// the next reconcile pass retries.
    pub async fn create_binding(&self, idx: usize, binding: &Binding) {
        let mut client = self.pool.client(idx);
        let request = CreateBindingRequest {
            binding: Some(binding.clone()),
        };

        match timeout(self.rpc_timeout, client.create_binding(request)).await {
            Ok(Ok(_)) => {
                tracing::debug!(
                    adapter = %self.pool.addr(idx),
                    binding = %binding,
                    "created binding"
                );
            }
            Ok(Err(status)) => {
                tracing::warn!(
                    adapter = %self.pool.addr(idx),
                    binding = %binding,
                    error = %status,
                    "failed to create binding"
                );
            }
            Err(_) => {
                tracing::warn!(
                    adapter = %self.pool.addr(idx),
                    binding = %binding,
                    "create binding timed out"
                );
            }
        }
    }

    /// Ask the adapter at `idx` to stop `binding`. Failures are logged;
    /// the next reconcile pass retries.
    pub async fn delete_binding(&self, idx: usize, binding: &Binding) {
        let mut client = self.pool.client(idx);
        let request = DeleteBindingRequest {
            binding: Some(binding.clone()),
        };

        match timeout(self.rpc_timeout, client.delete_binding(request)).await {
            Ok(Ok(_)) => {
                tracing::debug!(
                    adapter = %self.pool.addr(idx),
                    binding = %binding,
                    "deleted binding"
                );
            }
            Ok(Err(status)) => {
                tracing::warn!(
                    adapter = %self.pool.addr(idx),
                    binding = %binding,
                    error = %status,
                    "failed to delete binding"
                );
            }
            Err(_) => {
                tracing::warn!(
                    adapter = %self.pool.addr(idx),
                    binding = %binding,
                    "delete binding timed out"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "adapter_service_test.rs"]
mod adapter_service_test;
