//! Catalog API client
//!
//! Thin wrapper over the platform's binding catalog:
//! `GET {api_url}/v1/bindings[?next_id=N]`. One call fetches one page;
//! [`super::BindingFetcher`] drives the pagination.

use serde::Deserialize;

use super::{AppBindings, FetchError};

/// One page of catalog results.
#[derive(Debug, Deserialize)]
pub struct BindingsPage {
    #[serde(default)]
    pub results: AppBindings,

    /// Cursor for the next page; absent on the last one
    #[serde(default)]
    pub next_id: Option<u64>,
}

/// HTTP client for the binding catalog.
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Fetch one page of bindings.
    pub async fn bindings(&self, next_id: Option<u64>) -> Result<BindingsPage, FetchError> {
        let url = match next_id {
            Some(id) => format!("{}/v1/bindings?next_id={}", self.api_url, id),
            None => format!("{}/v1/bindings", self.api_url),
        };

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[path = "api_client_test.rs"]
mod api_client_test;
