//! Vouch Infrastructure - Adapters and implementations
//!
//! Concrete implementations of the ports defined in the application layer,
//! plus the settings and tracing setup a suite needs before its first
//! request.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::ReqwestHttpClient;
pub use config::{ConfigError, HarnessConfig};
pub use telemetry::init_tracing;
