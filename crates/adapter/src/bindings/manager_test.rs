use super::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Starter whose subscriptions are inert tasks that exit on cancel.
#[derive(Default)]
struct StubStarter {
    starts: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl SubscriptionStarter for StubStarter {
    async fn start(&self, _binding: Binding) -> Result<Subscription, EgressError> {
        if self.fail {
            return Err(EgressError::UnsupportedScheme {
                scheme: "https".to_string(),
            });
        }
        self.starts.fetch_add(1, Ordering::SeqCst);

        let stop = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            token.cancelled().await;
        });

        Ok(Subscription::new(stop, cancel, task))
    }
}

fn binding(n: u32) -> Binding {
    Binding {
        app_id: format!("app-{n}"),
        hostname: "host".to_string(),
        drain: "syslog://example.com:514/?drain-version=2.0".to_string(),
    }
}

#[tokio::test]
async fn test_create_starts_and_lists() {
    let starter = Arc::new(StubStarter::default());
    let manager = BindingManager::new(Arc::clone(&starter) as Arc<dyn SubscriptionStarter>);

    manager.create(binding(1)).await.unwrap();
    manager.create(binding(2)).await.unwrap();

    let mut listed = manager.list();
    listed.sort_by(|a, b| a.app_id.cmp(&b.app_id));
    assert_eq!(listed, vec![binding(1), binding(2)]);
    assert_eq!(manager.binding_count(), 2);
    assert_eq!(starter.starts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_create_is_idempotent() {
    let starter = Arc::new(StubStarter::default());
    let manager = BindingManager::new(Arc::clone(&starter) as Arc<dyn SubscriptionStarter>);

    manager.create(binding(1)).await.unwrap();
    manager.create(binding(1)).await.unwrap();

    assert_eq!(manager.binding_count(), 1);
    assert_eq!(starter.starts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_different_tuple_is_a_different_binding() {
    let starter = Arc::new(StubStarter::default());
    let manager = BindingManager::new(starter as Arc<dyn SubscriptionStarter>);

    manager.create(binding(1)).await.unwrap();

    let mut other_host = binding(1);
    other_host.hostname = "other".to_string();
    manager.create(other_host).await.unwrap();

    assert_eq!(manager.binding_count(), 2);
}

#[tokio::test]
async fn test_delete_removes_and_is_idempotent() {
    let starter = Arc::new(StubStarter::default());
    let manager = BindingManager::new(starter as Arc<dyn SubscriptionStarter>);

    manager.create(binding(1)).await.unwrap();
    manager.delete(&binding(1)).await;
    manager.delete(&binding(1)).await;

    assert_eq!(manager.binding_count(), 0);
}

#[tokio::test]
async fn test_failed_create_is_not_recorded() {
    let starter = Arc::new(StubStarter {
        fail: true,
        ..Default::default()
    });
    let manager = BindingManager::new(starter as Arc<dyn SubscriptionStarter>);

    let err = manager.create(binding(1)).await.unwrap_err();
    assert!(matches!(err, EgressError::UnsupportedScheme { .. }));
    assert_eq!(manager.binding_count(), 0);
}

#[tokio::test]
async fn test_drain_empties_the_registry() {
    let starter = Arc::new(StubStarter::default());
    let manager = BindingManager::new(starter as Arc<dyn SubscriptionStarter>);

    manager.create(binding(1)).await.unwrap();
    manager.create(binding(2)).await.unwrap();
    manager.drain().await;

    assert_eq!(manager.binding_count(), 0);
}
