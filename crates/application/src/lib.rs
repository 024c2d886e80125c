//! Vouch Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for external dependencies)
//! - The dispatch and evaluation use cases
//! - The fluent contract flow and scenario context
//! - Application-level error handling

pub mod context;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod evaluator;
pub mod ports;

pub use context::TestContext;
pub use contract::{ContractSpec, Dispatched, spec};
pub use dispatch::{DEFAULT_TIMEOUT, Dispatcher};
pub use error::{ApplicationError, ApplicationResult};
pub use evaluator::AssertionEvaluator;
pub use ports::{CancellationReceiver, CancellationToken, HttpClient, TransportError};
