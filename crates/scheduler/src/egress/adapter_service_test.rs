use super::*;
use crate::egress::testutil::{binding, spawn_adapter, MockAdapterState};
use crate::egress::AdapterPool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

async fn service_with(states: Vec<Arc<MockAdapterState>>) -> AdapterService {
    let mut addrs = Vec::new();
    for state in states {
        addrs.push(spawn_adapter(state).await);
    }
    AdapterService::new(AdapterPool::new(&addrs, None).unwrap())
        .with_rpc_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn test_round_trips_bindings() {
    let state = Arc::new(MockAdapterState::default());
    let service = service_with(vec![Arc::clone(&state)]).await;

    service.create_binding(0, &binding(1)).await;
    service.create_binding(0, &binding(2)).await;

    let listed = service.list_bindings(0).await;
    assert_eq!(listed.len(), 2);
    assert!(listed.contains(&binding(1)));
    assert!(listed.contains(&binding(2)));

    service.delete_binding(0, &binding(1)).await;
    let listed = service.list_bindings(0).await;
    assert_eq!(listed.len(), 1);
    assert!(listed.contains(&binding(2)));
}

#[tokio::test]
async fn test_adapters_are_independent() {
    let first = Arc::new(MockAdapterState::default());
    let second = Arc::new(MockAdapterState::default());
    let service = service_with(vec![Arc::clone(&first), Arc::clone(&second)]).await;

    service.create_binding(1, &binding(7)).await;

    assert!(service.list_bindings(0).await.is_empty());
    assert_eq!(service.list_bindings(1).await.len(), 1);
    assert_eq!(first.creates.load(Ordering::SeqCst), 0);
    assert_eq!(second.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_adapter_reads_as_empty() {
    // Nothing listens on this address; the channel is lazy so the failure
    // surfaces on the RPC, which must degrade to an empty set.
    let pool = AdapterPool::new(&["127.0.0.1:1".to_string()], None).unwrap();
    let service = AdapterService::new(pool).with_rpc_timeout(Duration::from_secs(2));

    assert!(service.list_bindings(0).await.is_empty());

    // Create and delete must swallow the failure too.
    service.create_binding(0, &binding(1)).await;
    service.delete_binding(0, &binding(1)).await;
}
