//! Drain blacklist filter
//!
//! Drops drains whose host is an IP literal inside an operator-configured
//! CIDR range. Hostnames are not resolved here - resolution at filter
//! time would make the result depend on DNS - so non-literal hosts pass
//! through. Apps whose drain list empties out are dropped entirely.

use async_trait::async_trait;
use std::net::IpAddr;
use url::Url;

use super::ip_ranges::IpRanges;
use super::{AppBindings, BindingReader, FetchError};

/// Filter that removes drains pointing into blacklisted ranges.
pub struct BlacklistFilter<R> {
    ranges: IpRanges,
    inner: R,
}

impl<R> BlacklistFilter<R> {
    pub fn new(ranges: IpRanges, inner: R) -> Self {
        Self { ranges, inner }
    }

    fn blocked(&self, drain: &str) -> bool {
        let Ok(url) = Url::parse(drain) else {
            // Unparseable drains cannot be vetted; drop them. The version
            // filter already removed them in the normal chain.
            return true;
        };
        let Some(host) = url.host_str() else {
            return true;
        };

        let literal = host.trim_start_matches('[').trim_end_matches(']');
        match literal.parse::<IpAddr>() {
            Ok(ip) => self.ranges.contains(ip),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl<R: BindingReader> BindingReader for BlacklistFilter<R> {
    async fn fetch_bindings(&self) -> Result<AppBindings, FetchError> {
        let mut bindings = self.inner.fetch_bindings().await?;

        for record in bindings.values_mut() {
            record.drains.retain(|drain| !self.blocked(drain));
        }
        bindings.retain(|_, record| !record.drains.is_empty());

        Ok(bindings)
    }
}

#[cfg(test)]
#[path = "blacklist_filter_test.rs"]
mod blacklist_filter_test;
