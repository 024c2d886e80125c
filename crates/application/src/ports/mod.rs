//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod http_client;

pub use http_client::{
    CancellationReceiver, CancellationToken, ExecuteFuture, HttpClient, TransportError,
};
