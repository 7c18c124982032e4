//! Signable attributes: a value plus the metadata that vouches for it.
//!
//! A write that actually changes the value stamps the timestamps, fixes the
//! display level, replaces the signature and reports a human-readable
//! description of the change. A write that changes nothing does nothing.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::metadata::{DisplayLevel, Metadata};
use super::value::AttributeValue;
use crate::crypto::LeafSigner;
use crate::error::{PublisherError, Result, SigningConfigError};
use crate::time::{format_timestamp, is_sentinel};
use crate::tree::FlatValue;

/// Everything a write needs besides the new value.
#[derive(Clone, Copy)]
pub struct WriteContext<'a> {
    /// Time stamped onto changed attributes.
    pub now: DateTime<Utc>,
    /// Signing capability; only required when a signature must be produced.
    pub signer: Option<&'a dyn LeafSigner>,
    /// Display level for attributes that do not carry one yet.
    pub display_level: Option<DisplayLevel>,
}

/// Human-readable description of one attribute change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChangeDescription(pub String);

impl ChangeDescription {
    /// Describe a change from `initial` to `new`.
    ///
    /// Mapping-shaped values are diffed by member: additions first, then
    /// removals, each sorted (`+d, -a`). Anything else renders as
    /// `initial --> new`.
    pub fn between(initial: &AttributeValue, new: &AttributeValue) -> Self {
        match (initial.members(), new.members()) {
            (Some(before), Some(after)) => {
                let added: Vec<String> =
                    after.difference(&before).map(|m| format!("+{m}")).collect();
                let removed: Vec<String> =
                    before.difference(&after).map(|m| format!("-{m}")).collect();

                if added.is_empty() && removed.is_empty() {
                    // same members, different payloads
                    return Self(format!("{initial} --> {new}"));
                }
                Self(added.into_iter().chain(removed).collect::<Vec<_>>().join(", "))
            }
            (None, Some(after)) if initial.is_empty() => Self(
                after
                    .iter()
                    .map(|m| format!("+{m}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => Self(format!("{initial} --> {new}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChangeDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signed attribute of the raw profile tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SignableAttribute {
    value: AttributeValue,
    metadata: Option<Metadata>,
    signature: Option<Value>,
    extra: serde_json::Map<String, Value>,
}

impl SignableAttribute {
    /// Build an attribute from its wire object.
    pub fn from_wire(path: &str, attribute: &serde_json::Map<String, Value>) -> Result<Self> {
        let value = AttributeValue::from_wire(path, attribute)?;

        let metadata = match attribute.get("metadata") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(Metadata::from_wire(path, raw)?),
        };

        let signature = attribute.get("signature").cloned();
        if metadata.is_none() && signature.is_some() {
            return Err(PublisherError::schema(path, "signed attribute has no metadata"));
        }

        let extra = attribute
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "value" | "values" | "metadata" | "signature"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            value,
            metadata,
            signature,
            extra,
        })
    }

    /// Wire object for this attribute.
    pub fn to_wire(&self) -> Result<Value> {
        let mut object = self.unsigned_wire()?;
        if let Some(signature) = &self.signature {
            object.insert("signature".to_string(), signature.clone());
        }
        Ok(Value::Object(object))
    }

    fn unsigned_wire(&self) -> Result<serde_json::Map<String, Value>> {
        let mut object = self.extra.clone();
        object.insert(self.value.field().to_string(), self.value.to_wire());
        if let Some(metadata) = &self.metadata {
            object.insert("metadata".to_string(), metadata.to_wire()?);
        }
        Ok(object)
    }

    /// Bytes covered by the signature: the attribute without its signature,
    /// as JSON with sorted keys.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&Value::Object(self.unsigned_wire()?))
            .map_err(|e| PublisherError::SerializationError(e.to_string()))
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn signature(&self) -> Option<&Value> {
        self.signature.as_ref()
    }

    /// Whether writes to this attribute are signed at all.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Write a new value.
    ///
    /// Returns `Ok(None)` when nothing changed, or when the attribute has no
    /// signature slot (the value is stored but neither stamped nor
    /// reported). On error the attribute is left untouched.
    pub fn write(
        &mut self,
        path: &str,
        input: &FlatValue,
        ctx: &WriteContext<'_>,
    ) -> Result<Option<ChangeDescription>> {
        let new_value = self.value.normalize(path, input)?;

        if new_value == self.value || (new_value.is_empty() && self.value.is_empty()) {
            return Ok(None);
        }

        if !self.is_signed() {
            self.value = new_value;
            return Ok(None);
        }

        let display_level = self
            .metadata
            .as_ref()
            .and_then(|m| m.display)
            .or(ctx.display_level)
            .ok_or_else(|| SigningConfigError::MissingDisplayLevel {
                attribute: path.to_string(),
            })?;
        let signer = ctx.signer.ok_or(SigningConfigError::MissingSigningKey)?;

        let mut updated = Self {
            value: new_value,
            metadata: self.metadata.clone(),
            signature: None,
            extra: self.extra.clone(),
        };

        let stamp = format_timestamp(ctx.now);
        if let Some(metadata) = updated.metadata.as_mut() {
            if is_sentinel(&metadata.created) {
                metadata.created = stamp.clone();
            }
            metadata.last_modified = stamp;
            metadata.display = Some(display_level);
        }

        let block = signer.sign_leaf(&updated.canonical_bytes()?)?;
        updated.signature = Some(
            serde_json::to_value(block)
                .map_err(|e| PublisherError::SerializationError(e.to_string()))?,
        );

        let initial = std::mem::replace(self, updated);
        Ok(Some(ChangeDescription::between(&initial.value, &self.value)))
    }
}
