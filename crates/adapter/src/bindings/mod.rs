//! Binding registry and control-plane surface
//!
//! [`manager`] tracks the live subscriptions on this adapter; [`grpc`]
//! exposes it to the scheduler as the `Adapter` service.

pub mod grpc;
pub mod manager;

pub use grpc::BindingService;
pub use manager::BindingManager;
