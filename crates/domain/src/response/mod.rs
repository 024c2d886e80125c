//! HTTP Response domain types

mod record;

pub use record::{ResponseRecord, StatusCode};
