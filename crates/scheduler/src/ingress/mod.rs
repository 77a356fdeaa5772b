//! Binding ingress
//!
//! The desired state of the world comes from the platform catalog as
//! [`AppBindings`] and flows through a decorator chain of
//! [`BindingReader`]s: `BlacklistFilter` → `VersionFilter` →
//! `BindingFetcher` → `ApiClient`. Each filter narrows the drain lists
//! and drops apps that end up with none.

pub mod api_client;
pub mod blacklist_filter;
pub mod fetcher;
pub mod ip_ranges;
pub mod version_filter;

pub use api_client::ApiClient;
pub use blacklist_filter::BlacklistFilter;
pub use fetcher::BindingFetcher;
pub use ip_ranges::IpRanges;
pub use version_filter::VersionFilter;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

/// One app's drain configuration as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppBinding {
    /// User-facing application name, used as the RFC 5424 hostname
    pub hostname: String,

    /// Drain URLs attached to the app
    #[serde(default)]
    pub drains: Vec<String>,
}

/// App id → binding record.
pub type AppBindings = HashMap<String, AppBinding>;

/// Errors fetching the binding universe.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The catalog request itself failed
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status
    #[error("catalog returned {status}")]
    Status { status: reqwest::StatusCode },
}

/// Source of the desired binding universe. Implemented by the fetcher and
/// by each filter wrapping it.
#[async_trait]
pub trait BindingReader: Send + Sync {
    async fn fetch_bindings(&self) -> Result<AppBindings, FetchError>;
}
