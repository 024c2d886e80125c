//! Explicit state threaded between the steps of a scenario.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use vouch_domain::response::ResponseRecord;

use crate::{ApplicationError, ApplicationResult};

/// Values captured by one step and consumed by later ones, such as the id
/// of a company created earlier in the same scenario.
///
/// A context is owned by the scenario that created it. Nothing is shared
/// between scenarios.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestContext {
    values: HashMap<String, Value>,
}

impl TestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous value under `key`.
    pub fn capture(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Stores the body value at `pointer` (e.g. `/id`, `/company/cnpj`).
    ///
    /// # Errors
    ///
    /// Returns `MissingCapture` if the response has no value there.
    pub fn capture_from(
        &mut self,
        key: impl Into<String>,
        response: &ResponseRecord,
        pointer: &str,
    ) -> ApplicationResult<&Value> {
        let key = key.into();
        let value = response
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| ApplicationError::MissingCapture(format!("{key} (body{pointer})")))?;
        tracing::debug!(key = %key, value = %value, "captured value");
        Ok(self.values.entry(key).insert_entry(value).into_mut())
    }

    /// Returns the value under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCapture` if nothing was captured under `key`.
    pub fn require(&self, key: &str) -> ApplicationResult<&Value> {
        self.get(key)
            .ok_or_else(|| ApplicationError::MissingCapture(key.to_string()))
    }

    /// Decodes the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCapture` or `InvalidCapture`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> ApplicationResult<T> {
        let value = self.require(key)?;
        serde_json::from_value(value.clone()).map_err(|e| ApplicationError::InvalidCapture {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}
