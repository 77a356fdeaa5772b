//! Log-bus ingress
//!
//! [`client_pool`] maintains the gRPC channels to the log-bus nodes;
//! [`subscriber`] runs the per-binding forwarding loop.

pub mod client_pool;
pub mod subscriber;

pub use client_pool::{ClientPool, ClientPoolError};
pub use subscriber::{Subscriber, Subscription, SubscriptionStarter};
