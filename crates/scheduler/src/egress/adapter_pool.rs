//! Adapter connection pool
//!
//! One lazily-connected gRPC channel per adapter address. The pool keeps
//! configuration order: the orchestrator breaks placement ties by index,
//! so a stable order is what keeps assignments stable across reconciles.

use sluice_protocol::adapter::v1::adapter_client::AdapterClient;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

/// Errors from building the pool.
#[derive(Debug, thiserror::Error)]
pub enum AdapterPoolError {
    /// No adapter addresses were configured
    #[error("no adapter addresses configured")]
    NoAdapters,

    /// An address did not form a valid endpoint
    #[error("invalid adapter address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },
}

#[derive(Debug)]
struct AdapterHandle {
    addr: String,
    client: AdapterClient<Channel>,
}

/// Ordered pool of adapter clients.
#[derive(Debug)]
pub struct AdapterPool {
    adapters: Vec<AdapterHandle>,
}

impl AdapterPool {
    /// Build a pool over `addrs` (`host:port` pairs), preserving order.
    /// With `tls` set the channels use mutual TLS; without it they are
    /// plaintext, which only tests use.
    pub fn new(addrs: &[String], tls: Option<ClientTlsConfig>) -> Result<Self, AdapterPoolError> {
        if addrs.is_empty() {
            return Err(AdapterPoolError::NoAdapters);
        }

        let scheme = if tls.is_some() { "https" } else { "http" };

        let mut adapters = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let mut endpoint = Endpoint::from_shared(format!("{scheme}://{addr}")).map_err(
                |source| AdapterPoolError::InvalidAddress {
                    addr: addr.clone(),
                    source,
                },
            )?;
            if let Some(ref tls) = tls {
                endpoint = endpoint.tls_config(tls.clone()).map_err(|source| {
                    AdapterPoolError::InvalidAddress {
                        addr: addr.clone(),
                        source,
                    }
                })?;
            }
            adapters.push(AdapterHandle {
                addr: addr.clone(),
                client: AdapterClient::new(endpoint.connect_lazy()),
            });
        }

        Ok(Self { adapters })
    }

    /// Number of adapters in the pool
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Address of the adapter at `idx`
    pub fn addr(&self, idx: usize) -> &str {
        &self.adapters[idx].addr
    }

    /// Client for the adapter at `idx`; a cheap clone of the channel
    pub fn client(&self, idx: usize) -> AdapterClient<Channel> {
        self.adapters[idx].client.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_addresses_rejected() {
        let err = AdapterPool::new(&[], None).unwrap_err();
        assert!(matches!(err, AdapterPoolError::NoAdapters));
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let addrs = vec![
            "127.0.0.1:3000".to_string(),
            "127.0.0.1:1000".to_string(),
            "127.0.0.1:2000".to_string(),
        ];
        let pool = AdapterPool::new(&addrs, None).unwrap();

        assert_eq!(pool.len(), 3);
        for (idx, addr) in addrs.iter().enumerate() {
            assert_eq!(pool.addr(idx), addr);
        }
    }

    #[test]
    fn test_invalid_address_rejected() {
        let err = AdapterPool::new(&["bad address".to_string()], None).unwrap_err();
        assert!(matches!(err, AdapterPoolError::InvalidAddress { .. }));
    }
}
