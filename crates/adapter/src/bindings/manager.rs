//! Subscription registry
//!
//! At most one subscription per binding tuple. The scheduler's RPCs
//! arrive concurrently, so the map is guarded by a mutex - held only
//! across map reads and updates, never across connecting, stopping, or
//! any other await point.

use std::collections::HashMap;

use parking_lot::Mutex;
use sluice_egress::EgressError;
use sluice_protocol::adapter::v1::Binding;
use std::sync::Arc;

use crate::ingress::{Subscription, SubscriptionStarter};

/// Registry of live subscriptions, keyed by the exact binding tuple.
pub struct BindingManager {
    starter: Arc<dyn SubscriptionStarter>,
    subscriptions: Mutex<HashMap<Binding, Subscription>>,
}

impl BindingManager {
    pub fn new(starter: Arc<dyn SubscriptionStarter>) -> Self {
        Self {
            starter,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Bindings currently being forwarded
    pub fn list(&self) -> Vec<Binding> {
        self.subscriptions.lock().keys().cloned().collect()
    }

    /// Number of live subscriptions
    pub fn binding_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Start a subscription for `binding`. A no-op when the binding is
    /// already present; an error means the binding is unusable and was
    /// not recorded.
    pub async fn create(&self, binding: Binding) -> Result<(), EgressError> {
        if self.subscriptions.lock().contains_key(&binding) {
            return Ok(());
        }

        let subscription = self.starter.start(binding.clone()).await?;

        // Two concurrent creates can both reach here; the loser stops the
        // subscription it just started.
        let duplicate = {
            let mut subscriptions = self.subscriptions.lock();
            if subscriptions.contains_key(&binding) {
                Some(subscription)
            } else {
                tracing::info!(binding = %binding, "binding created");
                subscriptions.insert(binding, subscription);
                None
            }
        };

        if let Some(subscription) = duplicate {
            subscription.stop().await;
        }

        Ok(())
    }

    /// Stop and remove the subscription for `binding`. A no-op when
    /// absent.
    pub async fn delete(&self, binding: &Binding) {
        let subscription = self.subscriptions.lock().remove(binding);
        if let Some(subscription) = subscription {
            tracing::info!(binding = %binding, "binding deleted");
            subscription.stop().await;
        }
    }

    /// Stop every subscription. Used on shutdown.
    pub async fn drain(&self) {
        let subscriptions: Vec<Subscription> = {
            let mut map = self.subscriptions.lock();
            map.drain().map(|(_, s)| s).collect()
        };
        for subscription in subscriptions {
            subscription.stop().await;
        }
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
