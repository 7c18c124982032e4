//! Values held by signed attributes.
//!
//! On the wire an attribute carries either `value` (a scalar) or `values`
//! (a mapping). A mapping whose members all map to `null` is a set. Which
//! of the two fields is present decides the attribute's kind for good.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PublisherError, Result};
use crate::tree::{FlatMap, FlatValue};

/// A scalar attribute payload. The wire schema has no numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Text(String),
}

/// Member → optional payload. All-`None` means a plain set.
pub type ValueSet = BTreeMap<String, Option<String>>;

/// The payload of a signed attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Value(Option<Scalar>),
    Values(Option<ValueSet>),
}

impl AttributeValue {
    /// Wire field name for this kind.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Values(_) => "values",
        }
    }

    /// Null, or a mapping with no members.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Value(v) => v.is_none(),
            Self::Values(v) => v.as_ref().map_or(true, BTreeMap::is_empty),
        }
    }

    /// Member names when mapping-shaped.
    pub fn members(&self) -> Option<BTreeSet<&str>> {
        match self {
            Self::Values(Some(set)) => Some(set.keys().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Parse the payload of a wire attribute.
    pub fn from_wire(path: &str, attribute: &serde_json::Map<String, Value>) -> Result<Self> {
        match (attribute.get("value"), attribute.get("values")) {
            (Some(_), Some(_)) => Err(PublisherError::schema(
                path,
                "attribute carries both value and values",
            )),
            (Some(value), None) => match value {
                Value::Null => Ok(Self::Value(None)),
                Value::Bool(b) => Ok(Self::Value(Some(Scalar::Bool(*b)))),
                Value::String(s) => Ok(Self::Value(Some(Scalar::Text(s.clone())))),
                other => Err(PublisherError::schema(
                    path,
                    format!("unsupported scalar value {other}"),
                )),
            },
            (None, Some(values)) => match values {
                Value::Null => Ok(Self::Values(None)),
                Value::Object(map) => {
                    let mut set = ValueSet::new();
                    for (member, payload) in map {
                        let payload = match payload {
                            Value::Null => None,
                            Value::String(s) => Some(s.clone()),
                            other => {
                                return Err(PublisherError::schema(
                                    path,
                                    format!("unsupported payload for member '{member}': {other}"),
                                ))
                            }
                        };
                        set.insert(member.clone(), payload);
                    }
                    Ok(Self::Values(Some(set)))
                }
                other => Err(PublisherError::schema(
                    path,
                    format!("values must be a mapping, got {other}"),
                )),
            },
            (None, None) => Err(PublisherError::schema(path, "attribute has no value")),
        }
    }

    /// Wire representation of the payload (without the field name).
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Value(None) | Self::Values(None) => Value::Null,
            Self::Value(Some(Scalar::Bool(b))) => Value::Bool(*b),
            Self::Value(Some(Scalar::Text(s))) => Value::String(s.clone()),
            Self::Values(Some(set)) => Value::Object(
                set.iter()
                    .map(|(k, v)| (k.clone(), v.clone().map_or(Value::Null, Value::String)))
                    .collect(),
            ),
        }
    }

    /// Flat-view projection.
    pub fn to_flat(&self) -> FlatValue {
        match self {
            Self::Value(None) | Self::Values(None) => FlatValue::Null,
            Self::Value(Some(Scalar::Bool(b))) => FlatValue::Bool(*b),
            Self::Value(Some(Scalar::Text(s))) => FlatValue::Text(s.clone()),
            Self::Values(Some(set)) if set.values().all(Option::is_none) => {
                FlatValue::List(set.keys().cloned().collect())
            }
            Self::Values(Some(set)) => FlatValue::Map(
                set.iter()
                    .map(|(k, v)| (k.clone(), v.clone().map_or(FlatValue::Null, FlatValue::Text)))
                    .collect(),
            ),
        }
    }

    /// Normalise a flat value into a payload of the same kind as `self`.
    ///
    /// Numbers become strings and lists become sorted, de-duplicated sets.
    /// Empty lists and maps are treated as empty.
    pub fn normalize(&self, path: &str, input: &FlatValue) -> Result<Self> {
        match self {
            Self::Value(_) => normalize_scalar(path, input).map(Self::Value),
            Self::Values(_) => normalize_set(path, input).map(Self::Values),
        }
    }
}

fn normalize_scalar(path: &str, input: &FlatValue) -> Result<Option<Scalar>> {
    match input {
        FlatValue::Null => Ok(None),
        FlatValue::Bool(b) => Ok(Some(Scalar::Bool(*b))),
        FlatValue::Number(n) => Ok(Some(Scalar::Text(n.to_string()))),
        FlatValue::Text(s) => Ok(Some(Scalar::Text(s.clone()))),
        FlatValue::List(items) if items.is_empty() => Ok(None),
        FlatValue::Map(map) if map.is_empty() => Ok(None),
        FlatValue::List(_) | FlatValue::Map(_) => Err(PublisherError::schema(
            path,
            "cannot write a collection into a scalar attribute",
        )),
    }
}

fn normalize_set(path: &str, input: &FlatValue) -> Result<Option<ValueSet>> {
    match input {
        FlatValue::Null => Ok(None),
        FlatValue::List(items) => Ok(Some(
            items.iter().map(|member| (member.clone(), None)).collect(),
        )),
        FlatValue::Map(map) => map_to_set(path, map).map(Some),
        FlatValue::Bool(_) | FlatValue::Number(_) | FlatValue::Text(_) => Err(
            PublisherError::schema(path, "cannot write a scalar into a set attribute"),
        ),
    }
}

fn map_to_set(path: &str, map: &FlatMap) -> Result<ValueSet> {
    map.iter()
        .map(|(member, payload)| {
            let payload = match payload {
                FlatValue::Null => None,
                FlatValue::Text(s) => Some(s.clone()),
                FlatValue::Number(n) => Some(n.to_string()),
                FlatValue::Bool(b) => Some(b.to_string()),
                FlatValue::List(_) | FlatValue::Map(_) => {
                    return Err(PublisherError::schema(
                        path,
                        format!("member '{member}' must be a string or null"),
                    ))
                }
            };
            Ok((member.clone(), payload))
        })
        .collect()
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(Some(Scalar::Text(s))) => f.write_str(s),
            Self::Value(Some(Scalar::Bool(b))) => write!(f, "{b}"),
            other => write!(f, "{}", other.to_wire()),
        }
    }
}
