//! Partial JSON patterns.
//!
//! A pattern describes only the parts of a response body a contract cares
//! about. Objects match when every listed key matches (extra keys are
//! ignored), arrays match element by element at the same index, regex
//! leaves match the string form of the actual value and literal leaves
//! require deep equality.

use std::borrow::Cow;
use std::fmt;

use regex::Regex;
use serde_json::Value;

use super::report::AssertionFailure;
use crate::error::{ConfigurationError, DomainResult};

/// A regular-expression leaf.
#[derive(Debug, Clone)]
pub struct RegexLeaf(Regex);

impl RegexLeaf {
    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true if the value's string form matches.
    #[must_use]
    pub fn is_match(&self, value: &Value) -> bool {
        self.0.is_match(&string_form(value))
    }
}

impl PartialEq for RegexLeaf {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Display for RegexLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

/// A partial JSON template.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonPattern {
    /// Matches by deep equality.
    Literal(Value),
    /// Matches when the actual value's string form satisfies the regex.
    Regex(RegexLeaf),
    /// Matches an object containing at least these keys.
    Object(ObjectPattern),
    /// Matches an array element by element.
    Array(Vec<JsonPattern>),
}

impl JsonPattern {
    /// Builds a regex leaf. The regex is unanchored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` if the expression does not compile.
    pub fn regex(pattern: &str) -> DomainResult<Self> {
        Regex::new(pattern)
            .map(|re| Self::Regex(RegexLeaf(re)))
            .map_err(|e| ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Starts an object pattern.
    #[must_use]
    pub fn object() -> ObjectPattern {
        ObjectPattern::new()
    }

    /// Builds an array pattern from its elements.
    #[must_use]
    pub fn array<I, P>(elements: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Self>,
    {
        Self::Array(elements.into_iter().map(Into::into).collect())
    }

    /// Matches `actual` against this pattern.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch found, walking object keys in pattern
    /// order and arrays by index.
    pub fn match_value(&self, actual: &Value) -> Result<(), AssertionFailure> {
        self.match_at(actual, "$")
    }

    fn match_at(&self, actual: &Value, path: &str) -> Result<(), AssertionFailure> {
        match self {
            Self::Literal(expected) => {
                if values_equal(expected, actual) {
                    Ok(())
                } else {
                    Err(AssertionFailure::new(path, expected.to_string(), preview(actual)))
                }
            }
            Self::Regex(leaf) => {
                if leaf.is_match(actual) {
                    Ok(())
                } else {
                    Err(AssertionFailure::new(path, leaf.to_string(), preview(actual)))
                }
            }
            Self::Object(object) => {
                let Value::Object(map) = actual else {
                    return Err(AssertionFailure::new(path, "an object", type_name(actual)));
                };
                for (key, pattern) in &object.fields {
                    let child = child_key_path(path, key);
                    match map.get(key) {
                        Some(value) => pattern.match_at(value, &child)?,
                        None => {
                            return Err(AssertionFailure::new(child, pattern.summary(), "missing"));
                        }
                    }
                }
                Ok(())
            }
            Self::Array(elements) => {
                let Value::Array(items) = actual else {
                    return Err(AssertionFailure::new(path, "an array", type_name(actual)));
                };
                for (index, pattern) in elements.iter().enumerate() {
                    let child = format!("{path}[{index}]");
                    match items.get(index) {
                        Some(value) => pattern.match_at(value, &child)?,
                        None => {
                            return Err(AssertionFailure::new(child, pattern.summary(), "missing"));
                        }
                    }
                }
                Ok(())
            }
        }
    }

    fn summary(&self) -> String {
        match self {
            Self::Literal(value) => value.to_string(),
            Self::Regex(leaf) => leaf.to_string(),
            Self::Object(_) => "an object".to_string(),
            Self::Array(_) => "an array".to_string(),
        }
    }
}

impl fmt::Display for JsonPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Regex(leaf) => write!(f, "{leaf}"),
            Self::Object(object) => {
                f.write_str("{")?;
                for (i, (key, pattern)) in object.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{pattern}", Value::String(key.clone()))?;
                }
                f.write_str("}")
            }
            Self::Array(elements) => {
                f.write_str("[")?;
                for (i, pattern) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{pattern}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Object pattern with keys kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPattern {
    fields: Vec<(String, JsonPattern)>,
}

impl ObjectPattern {
    /// Creates an empty object pattern (matches any object).
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds or replaces a key.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, pattern: impl Into<JsonPattern>) -> Self {
        let key = key.into();
        let pattern = pattern.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = pattern,
            None => self.fields.push((key, pattern)),
        }
        self
    }

    /// Returns the number of keys.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len is not const in stable
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no key is constrained.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<ObjectPattern> for JsonPattern {
    fn from(object: ObjectPattern) -> Self {
        Self::Object(object)
    }
}

impl From<Value> for JsonPattern {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(ObjectPattern {
                fields: map.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            }),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            scalar => Self::Literal(scalar),
        }
    }
}

impl From<&str> for JsonPattern {
    fn from(value: &str) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<String> for JsonPattern {
    fn from(value: String) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<bool> for JsonPattern {
    fn from(value: bool) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<i64> for JsonPattern {
    fn from(value: i64) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<i32> for JsonPattern {
    fn from(value: i32) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<u64> for JsonPattern {
    fn from(value: u64) -> Self {
        Self::Literal(Value::from(value))
    }
}

/// Deep equality where numbers compare by value, so `1` equals `1.0`.
fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => {
            if a.is_f64() || b.is_f64() {
                a.as_f64() == b.as_f64()
            } else {
                a == b
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => expected == actual,
    }
}

fn string_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(value: &Value) -> String {
    const MAX_CHARS: usize = 100;
    let text = value.to_string();
    if text.chars().count() > MAX_CHARS {
        let cut: String = text.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        text
    }
}

fn child_key_path(parent: &str, key: &str) -> String {
    let plain = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        format!("{parent}.{key}")
    } else {
        format!("{parent}[{}]", Value::String(key.to_string()))
    }
}
