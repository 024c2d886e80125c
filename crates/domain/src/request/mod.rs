//! HTTP Request domain types

mod descriptor;
mod header;
mod method;

pub use descriptor::{RequestBuilder, RequestDescriptor};
pub use header::{Header, Headers};
pub use method::HttpMethod;
