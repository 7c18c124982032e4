//! Attribute metadata and display levels.

use serde::{Deserialize, Serialize};

use crate::error::{PublisherError, Result};

/// Visibility classification of a signed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLevel {
    Private,
    Staff,
    Ndaed,
    Vouched,
    Authenticated,
    Public,
}

impl DisplayLevel {
    /// Return a stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Staff => "staff",
            Self::Ndaed => "ndaed",
            Self::Vouched => "vouched",
            Self::Authenticated => "authenticated",
            Self::Public => "public",
        }
    }
}

impl std::fmt::Display for DisplayLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisplayLevel {
    type Err = PublisherError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(Self::Private),
            "staff" => Ok(Self::Staff),
            "ndaed" => Ok(Self::Ndaed),
            "vouched" => Ok(Self::Vouched),
            "authenticated" => Ok(Self::Authenticated),
            "public" => Ok(Self::Public),
            other => Err(PublisherError::schema(
                "metadata.display",
                format!("unknown display level '{other}'"),
            )),
        }
    }
}

/// The `metadata` object of a signed attribute.
///
/// Timestamps are kept as their wire strings so untouched attributes
/// round-trip byte for byte. Fields this crate does not manage
/// (`classification`, `verified`, ...) are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub created: String,
    pub last_modified: String,
    #[serde(default)]
    pub display: Option<DisplayLevel>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// The wire object had no `display` key at all.
    #[serde(skip)]
    display_omitted: bool,
}

impl Metadata {
    /// Parse a wire `metadata` object.
    pub fn from_wire(path: &str, raw: &serde_json::Value) -> Result<Self> {
        let mut metadata = serde_json::from_value::<Self>(raw.clone())
            .map_err(|e| PublisherError::schema(path, format!("invalid metadata: {e}")))?;
        metadata.display_omitted = raw.get("display").is_none();
        Ok(metadata)
    }

    /// Wire form. An unset display level is only written back if the
    /// original object carried the key.
    pub fn to_wire(&self) -> Result<serde_json::Value> {
        let mut wire = serde_json::to_value(self)
            .map_err(|e| PublisherError::SerializationError(e.to_string()))?;
        if self.display_omitted && self.display.is_none() {
            if let Some(object) = wire.as_object_mut() {
                object.remove("display");
            }
        }
        Ok(wire)
    }
}
