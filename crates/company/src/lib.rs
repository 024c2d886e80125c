//! Vouch Company - contract suite for the company registry service
//!
//! Fixtures, URL helpers and the fifteen contract scenarios that pin down
//! the observable behaviour of `/company`. The suite is generic over the
//! `HttpClient` port, so it runs against the live service or an in-process
//! stub alike.

pub mod model;
pub mod scenarios;

pub use model::{Company, CompanyApi, CompanyUpdate, NewCompany};
pub use scenarios::{CompanySuite, ScenarioOutcome};
