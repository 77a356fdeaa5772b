//! Drain version filter
//!
//! Keeps only drains this system can serve: a URL that parses, a
//! `syslog`/`syslog-tls` scheme, and an explicit `drain-version=2.0`
//! query parameter. Apps whose drain list empties out are dropped
//! entirely.

use async_trait::async_trait;
use url::Url;

use super::{AppBindings, BindingReader, FetchError};

const DRAIN_VERSION_PARAM: &str = "drain-version";
const SUPPORTED_VERSION: &str = "2.0";

/// Filter that removes unsupported and malformed drains.
pub struct VersionFilter<R> {
    inner: R,
}

impl<R> VersionFilter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

fn supported(drain: &str) -> bool {
    let Ok(url) = Url::parse(drain) else {
        return false;
    };
    if !matches!(url.scheme(), "syslog" | "syslog-tls") {
        return false;
    }
    url.query_pairs()
        .any(|(key, value)| key == DRAIN_VERSION_PARAM && value == SUPPORTED_VERSION)
}

#[async_trait]
impl<R: BindingReader> BindingReader for VersionFilter<R> {
    async fn fetch_bindings(&self) -> Result<AppBindings, FetchError> {
        let mut bindings = self.inner.fetch_bindings().await?;

        for record in bindings.values_mut() {
            record.drains.retain(|drain| supported(drain));
        }
        bindings.retain(|_, record| !record.drains.is_empty());

        Ok(bindings)
    }
}

#[cfg(test)]
#[path = "version_filter_test.rs"]
mod version_filter_test;
