//! Sluice egress - syslog drain delivery
//!
//! Everything between a log-bus envelope and the remote syslog receiver:
//!
//! - [`rfc5424`] - pure envelope-to-frame encoding
//! - [`diode`] - the lossy single-producer/single-consumer ring that
//!   isolates ingress from slow drains
//! - [`writer`] - lazily-connecting TCP/TLS writers with reconnect backoff
//! - [`connector`] - drain-URL-to-writer factory, wiring a writer behind a
//!   diode and its drain task
//!
//! # Design
//!
//! A `DrainWriter` is owned by exactly one task; reconnect bookkeeping
//! needs no locks because ownership never crosses tasks. Callers get a
//! [`DiodeWriter`] from the connector: its `write` is a non-blocking push
//! into the diode, and a spawned drain task moves envelopes from the diode
//! to the underlying connection. A stalled drain costs dropped envelopes
//! (counted), never a blocked producer.

pub mod connector;
pub mod diode;
mod error;
pub mod rfc5424;
pub mod writer;

pub use connector::{ConnectorConfig, DrainConnector, SyslogConnector};
pub use diode::Diode;
pub use error::EgressError;
pub use writer::{DrainWriter, SyslogWriter, WriterConfig};
