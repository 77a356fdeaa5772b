//! Log-bus client pool
//!
//! One lazily-connected channel per configured log-bus address. Channels
//! reconnect on their own; `next()` just round-robins so concurrent
//! subscriptions spread across the bus nodes.

use std::sync::atomic::{AtomicUsize, Ordering};

use sluice_protocol::logs::v1::egress_client::EgressClient;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

/// Errors from building the pool.
#[derive(Debug, thiserror::Error)]
pub enum ClientPoolError {
    /// No log-bus addresses were configured
    #[error("no log bus addresses configured")]
    NoAddresses,

    /// An address did not form a valid endpoint
    #[error("invalid log bus address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },
}

/// Round-robin pool of log-bus egress clients.
#[derive(Debug)]
pub struct ClientPool {
    clients: Vec<EgressClient<Channel>>,
    next: AtomicUsize,
}

impl ClientPool {
    /// Build a pool over `addrs` (`host:port` pairs). With `tls` set the
    /// channels use mutual TLS; without it they are plaintext, which only
    /// tests use.
    pub fn new(addrs: &[String], tls: Option<ClientTlsConfig>) -> Result<Self, ClientPoolError> {
        if addrs.is_empty() {
            return Err(ClientPoolError::NoAddresses);
        }

        let scheme = if tls.is_some() { "https" } else { "http" };

        let mut clients = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let mut endpoint = Endpoint::from_shared(format!("{scheme}://{addr}")).map_err(
                |source| ClientPoolError::InvalidAddress {
                    addr: addr.clone(),
                    source,
                },
            )?;
            if let Some(ref tls) = tls {
                endpoint =
                    endpoint
                        .tls_config(tls.clone())
                        .map_err(|source| ClientPoolError::InvalidAddress {
                            addr: addr.clone(),
                            source,
                        })?;
            }
            clients.push(EgressClient::new(endpoint.connect_lazy()));
        }

        Ok(Self {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    /// Next client in round-robin order. Clients are cheap clones of the
    /// underlying channel.
    pub fn next(&self) -> EgressClient<Channel> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        self.clients[idx].clone()
    }

    /// Number of configured log-bus nodes
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
