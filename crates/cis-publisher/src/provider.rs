//! Boundary with the identity provider.
//!
//! The profile core never talks to the network itself. It reads documents
//! from a [`ProfileSource`] and hands changed documents to a
//! [`ProfileSink`]; the storage module provides filesystem and in-memory
//! implementations.

use serde_json::Value;

use crate::error::{PublisherError, Result};

/// Selects a stored profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    PrimaryEmail(String),
    UserId(String),
    PrimaryUsername(String),
}

impl IdentityKey {
    /// Name of the signed attribute the key is matched against.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::PrimaryEmail(_) => "primary_email",
            Self::UserId(_) => "user_id",
            Self::PrimaryUsername(_) => "primary_username",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PrimaryEmail(s) | Self::UserId(s) | Self::PrimaryUsername(s) => s,
        }
    }

    /// Whether `document` is the profile this key selects.
    pub fn matches(&self, document: &Value) -> bool {
        document[self.attribute()]["value"].as_str() == Some(self.as_str())
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where raw profile documents come from.
pub trait ProfileSource: Send + Sync {
    /// Fetch the document for `key`, or the skeleton profile when `key` is
    /// `None`. Fails with `NotFound` for an unknown key.
    fn fetch_profile(&self, key: Option<&IdentityKey>) -> Result<Value>;
}

/// Where changed profile documents go.
pub trait ProfileSink: Send + Sync {
    /// Submit a document. `Ok(false)` means the provider refused it; the
    /// caller reports that rather than failing.
    fn submit_profile(&self, document: &Value) -> Result<bool>;
}

/// Check a document carries what the provider needs to accept it and
/// return its user id.
pub fn validate_submission(document: &Value) -> Result<&str> {
    for required in ["primary_email", "primary_username"] {
        if document[required]["value"].as_str().is_none() {
            return Err(PublisherError::schema(
                required,
                "required to submit a profile",
            ));
        }
    }

    document["user_id"]["value"]
        .as_str()
        .ok_or_else(|| PublisherError::schema("user_id", "required to submit a profile"))
}
