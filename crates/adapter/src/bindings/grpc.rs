//! gRPC surface for the binding registry
//!
//! Implements the `Adapter` service the scheduler calls. Create and
//! Delete mirror the registry's idempotence; an unusable binding (bad
//! drain URL) comes back as `InvalidArgument` so the scheduler stops
//! retrying it.

use std::sync::Arc;

use sluice_protocol::adapter::v1::adapter_server::Adapter;
use sluice_protocol::adapter::v1::{
    Binding, CreateBindingRequest, CreateBindingResponse, DeleteBindingRequest,
    DeleteBindingResponse, ListBindingsRequest, ListBindingsResponse,
};
use tonic::{Request, Response, Status};

use super::manager::BindingManager;

/// `Adapter` service implementation backed by the registry.
pub struct BindingService {
    manager: Arc<BindingManager>,
}

impl BindingService {
    pub fn new(manager: Arc<BindingManager>) -> Self {
        Self { manager }
    }
}

fn required_binding(binding: Option<Binding>) -> Result<Binding, Status> {
    binding.ok_or_else(|| Status::invalid_argument("binding is required"))
}

#[tonic::async_trait]
impl Adapter for BindingService {
    async fn list_bindings(
        &self,
        _request: Request<ListBindingsRequest>,
    ) -> Result<Response<ListBindingsResponse>, Status> {
        Ok(Response::new(ListBindingsResponse {
            bindings: self.manager.list(),
        }))
    }

    async fn create_binding(
        &self,
        request: Request<CreateBindingRequest>,
    ) -> Result<Response<CreateBindingResponse>, Status> {
        let binding = required_binding(request.into_inner().binding)?;

        self.manager
            .create(binding)
            .await
            .map_err(|e| Status::invalid_argument(e.to_string()))?;

        Ok(Response::new(CreateBindingResponse {}))
    }

    async fn delete_binding(
        &self,
        request: Request<DeleteBindingRequest>,
    ) -> Result<Response<DeleteBindingResponse>, Status> {
        let binding = required_binding(request.into_inner().binding)?;

        self.manager.delete(&binding).await;

        Ok(Response::new(DeleteBindingResponse {}))
    }
}

#[cfg(test)]
#[path = "grpc_test.rs"]
mod grpc_test;
