//! Inbound parameter snapshots
//!
//! A [`Snapshot`] is a full or partial listing of fully-qualified parameter
//! names and raw values. It arrives either as a push map
//! (`name -> value`) or as a pulled `{ "parameters": [{ name, value }] }`
//! reply; both normalize to the same ordered list.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One raw entry of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawParameter {
    /// Fully-qualified name, `<node>.<param>`
    pub name: String,
    /// Tagged wire object or plain JSON value
    pub value: JsonValue,
}

impl RawParameter {
    /// Create raw entry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: JsonValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered listing of raw parameters, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Entries in arrival order
    #[serde(default)]
    pub parameters: Vec<RawParameter>,
}

impl Snapshot {
    /// Create snapshot from entries
    #[inline]
    #[must_use]
    pub fn new(parameters: Vec<RawParameter>) -> Self {
        Self { parameters }
    }

    /// Create snapshot from a push map, keeping iteration order
    #[must_use]
    pub fn from_push_map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        Self {
            parameters: entries
                .into_iter()
                .map(|(name, value)| RawParameter::new(name, value))
                .collect(),
        }
    }

    /// Append an entry
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.parameters.push(RawParameter::new(name, value));
        self
    }

    /// Parse any supported JSON shape
    ///
    /// Accepted: `{ "parameters": [...] }`, a bare `[{ name, value }, ...]`
    /// list, or a push map object `{ "<node>.<param>": value, ... }`.
    ///
    /// # Errors
    /// Invalid JSON or a top-level value of another shape
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Same as [`Snapshot::from_json`] for an already-parsed value
    ///
    /// # Errors
    /// A top-level value of an unsupported shape
    pub fn from_value(value: JsonValue) -> Result<Self, SnapshotError> {
        match value {
            JsonValue::Object(map) if map.get("parameters").is_some_and(JsonValue::is_array) => {
                Ok(serde_json::from_value(JsonValue::Object(map))?)
            }
            JsonValue::Object(map) => Ok(Self::from_push_map(map)),
            JsonValue::Array(_) => Ok(Self::new(serde_json::from_value(value)?)),
            JsonValue::Null => Err(SnapshotError::UnsupportedShape("null")),
            JsonValue::Bool(_) => Err(SnapshotError::UnsupportedShape("bool")),
            JsonValue::Number(_) => Err(SnapshotError::UnsupportedShape("number")),
            JsonValue::String(_) => Err(SnapshotError::UnsupportedShape("string")),
        }
    }

    /// Number of raw entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if snapshot has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Iterate over raw entries
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &RawParameter> {
        self.parameters.iter()
    }
}

impl FromIterator<RawParameter> for Snapshot {
    fn from_iter<T: IntoIterator<Item = RawParameter>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Errors reading a snapshot document
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Not valid JSON, or entries lacking `name`/`value`
    #[error("invalid snapshot json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Top-level JSON value is neither a map nor a list
    #[error("unsupported snapshot shape: {0}")]
    UnsupportedShape(&'static str),
}
