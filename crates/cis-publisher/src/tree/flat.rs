//! The flat working view of a profile.
//!
//! Signing metadata is hidden: a signed attribute shows up as its bare
//! value, a set of members shows up as a sorted list of strings, and
//! unsigned containers show up as nested maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PublisherError, Result};

/// Nested flat mapping, keyed by attribute name.
pub type FlatMap = BTreeMap<String, FlatValue>;

/// A value in the flat view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<String>),
    Map(FlatMap),
}

impl FlatValue {
    /// Convert arbitrary JSON into a flat value.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| PublisherError::SerializationError(format!("flat value: {e}")))
    }

    /// Whether the value carries nothing: null, `false`, zero, an empty
    /// string, list or map.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Number(n) => n.as_f64() == Some(0.0),
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FlatMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut FlatMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Member names when the value is list- or map-shaped.
    pub fn members(&self) -> Option<Vec<&str>> {
        match self {
            Self::List(items) => Some(items.iter().map(String::as_str).collect()),
            Self::Map(map) => Some(map.keys().map(String::as_str).collect()),
            _ => None,
        }
    }
}

impl From<&str> for FlatValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FlatValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for FlatValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FlatValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for FlatValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<Vec<String>> for FlatValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for FlatValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<FlatMap> for FlatValue {
    fn from(map: FlatMap) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<FlatValue>> From<Option<T>> for FlatValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Build a map of text values, e.g. `{"LDAP-1": "0xABC"}`.
pub fn text_map<K, V, I>(entries: I) -> FlatValue
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    FlatValue::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), FlatValue::Text(v.into())))
            .collect(),
    )
}
