//! Binding fetcher
//!
//! Drains the catalog's pagination and merges the pages into one
//! [`AppBindings`] map. Duplicate drains within an app are dropped on
//! exact URL equality, keeping first-seen order.

use async_trait::async_trait;

use super::api_client::ApiClient;
use super::{AppBinding, AppBindings, BindingReader, FetchError};

/// Fetches the full binding universe from the catalog.
pub struct BindingFetcher {
    client: ApiClient,
}

impl BindingFetcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BindingReader for BindingFetcher {
    async fn fetch_bindings(&self) -> Result<AppBindings, FetchError> {
        let mut all = AppBindings::new();
        let mut next_id = None;

        loop {
            let page = self.client.bindings(next_id).await?;

            for (app_id, record) in page.results {
                let entry = all.entry(app_id).or_insert_with(|| AppBinding {
                    hostname: record.hostname.clone(),
                    drains: Vec::new(),
                });
                for drain in record.drains {
                    if !entry.drains.contains(&drain) {
                        entry.drains.push(drain);
                    }
                }
            }

            match page.next_id {
                Some(id) => next_id = Some(id),
                None => break,
            }
        }

        Ok(all)
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod fetcher_test;
