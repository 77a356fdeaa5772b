//! In-process adapters for egress tests.

use std::collections::HashSet;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use parking_lot::Mutex;
use sluice_protocol::adapter::v1::adapter_server::{Adapter, AdapterServer};
use sluice_protocol::adapter::v1::{
    Binding, CreateBindingRequest, CreateBindingResponse, DeleteBindingRequest,
    DeleteBindingResponse, ListBindingsRequest, ListBindingsResponse,
};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

/// Observable state of one mock adapter.
#[derive(Default)]
pub(crate) struct MockAdapterState {
    pub bindings: Mutex<HashSet<Binding>>,
    pub creates: AtomicUsize,
    pub deletes: AtomicUsize,
}

#[derive(Clone)]
struct MockAdapter(Arc<MockAdapterState>);

#[tonic::async_trait]
impl Adapter for MockAdapter {
    async fn list_bindings(
        &self,
        _request: Request<ListBindingsRequest>,
    ) -> Result<Response<ListBindingsResponse>, Status> {
        Ok(Response::new(ListBindingsResponse {
            bindings: self.0.bindings.lock().iter().cloned().collect(),
        }))
    }

    async fn create_binding(
        &self,
        request: Request<CreateBindingRequest>,
    ) -> Result<Response<CreateBindingResponse>, Status> {
        let binding = request
            .into_inner()
            .binding
            .ok_or_else(|| Status::invalid_argument("binding is required"))?;
        self.0
            .creates
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.0.bindings.lock().insert(binding);
        Ok(Response::new(CreateBindingResponse {}))
    }

    async fn delete_binding(
        &self,
        request: Request<DeleteBindingRequest>,
    ) -> Result<Response<DeleteBindingResponse>, Status> {
        let binding = request
            .into_inner()
            .binding
            .ok_or_else(|| Status::invalid_argument("binding is required"))?;
        self.0
            .deletes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.0.bindings.lock().remove(&binding);
        Ok(Response::new(DeleteBindingResponse {}))
    }
}

/// Serve a mock adapter on an ephemeral port; returns its address.
pub(crate) async fn spawn_adapter(state: Arc<MockAdapterState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(AdapterServer::new(MockAdapter(state)))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .ok();
    });

    format!("127.0.0.1:{}", addr.port())
}

/// Binding fixture shared by the egress tests.
pub(crate) fn binding(n: u32) -> Binding {
    Binding {
        app_id: format!("app-{n}"),
        hostname: format!("host-{n}.example"),
        drain: format!("syslog://drain-{n}.example.com:514/?drain-version=2.0"),
    }
}
