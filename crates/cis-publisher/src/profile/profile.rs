//! The profile aggregate.
//!
//! A [`Profile`] keeps two views of one document: the raw tree, which is
//! authoritative and carries every signature, and the flat view callers
//! read and write. The raw tree is only brought up to date on
//! [`Profile::sign`], which is also where changes are detected and
//! described.

use serde_json::Value;

use super::deletable::{is_deletable, lookup};
use super::notification::Notification;
use crate::attribute::DisplayLevel;
use crate::error::{PublisherError, Result};
use crate::provider::{IdentityKey, ProfileSink, ProfileSource};
use crate::publisher::Publisher;
use crate::tree::{self, FlatMap, FlatValue, RawTree};

/// What [`Profile::publish`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing changed; nothing was submitted.
    Unchanged,
    /// Something changed but submission was suppressed.
    DryRun,
    /// The changed document was accepted.
    Published,
    /// The provider refused the changed document.
    Rejected,
}

impl PublishOutcome {
    /// Whether signing found any change.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// A short-lived, single-owner unit of work over one profile document.
#[derive(Debug, Clone)]
pub struct Profile {
    identity: Option<IdentityKey>,
    raw: RawTree,
    flat: FlatMap,
    active: bool,
    notifications: Vec<Notification>,
    display_level: Option<DisplayLevel>,
}

impl Profile {
    /// Fetch and load a profile. `None` loads the skeleton profile.
    ///
    /// # Errors
    ///
    /// `NotFound` from the source, `SchemaViolation` for documents the tree
    /// cannot represent, and `InactiveProfile` when the document is flagged
    /// inactive and `allow_inactive` is false.
    pub fn load(
        source: &dyn ProfileSource,
        identity: Option<IdentityKey>,
        allow_inactive: bool,
    ) -> Result<Self> {
        let document = source.fetch_profile(identity.as_ref())?;
        Self::from_document(identity, &document, allow_inactive)
    }

    /// Load a profile from an already-fetched document.
    pub fn from_document(
        identity: Option<IdentityKey>,
        document: &Value,
        allow_inactive: bool,
    ) -> Result<Self> {
        let raw = tree::bootstrap(document)?;
        let flat = tree::flatten(&raw);
        let active = flat.get("active").and_then(FlatValue::as_bool) != Some(false);

        let profile = Self {
            identity,
            raw,
            flat,
            active,
            notifications: Vec::new(),
            display_level: None,
        };

        if !profile.active && !allow_inactive {
            return Err(PublisherError::InactiveProfile(profile.display_name()));
        }

        Ok(profile)
    }

    pub fn identity(&self) -> Option<&IdentityKey> {
        self.identity.as_ref()
    }

    /// Whether the document was active when loaded.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Name used in log lines: the primary email when known.
    pub fn display_name(&self) -> String {
        match (self.get("primary_email").and_then(FlatValue::as_str), &self.identity) {
            (Some(email), _) => email.to_string(),
            (None, Some(key)) => key.to_string(),
            (None, None) => "skeleton profile".to_string(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.flat.get(key)
    }

    /// Read a nested value by dotted path, e.g. `identities.mozilla_posix_id`.
    pub fn get_path(&self, path: &str) -> Option<&FlatValue> {
        lookup(&self.flat, path)
    }

    /// Mutable access to a top-level value, for in-place edits of nested
    /// maps. Keys added this way are checked on the next sign.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut FlatValue> {
        self.flat.get_mut(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<FlatValue>) -> Result<()> {
        self.set_path(key, value)
    }

    /// Replace the value at a dotted path.
    ///
    /// # Errors
    ///
    /// `SchemaViolation` if the path does not already exist, or if a plain
    /// value would overwrite a nested map.
    pub fn set_path(&mut self, path: &str, value: impl Into<FlatValue>) -> Result<()> {
        let value = value.into();
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (Some(parent), key),
            None => (None, path),
        };

        let container = match parent {
            None => &mut self.flat,
            Some(parent) => {
                let mut node = &mut self.flat;
                for segment in parent.split('.') {
                    node = node
                        .get_mut(segment)
                        .and_then(FlatValue::as_map_mut)
                        .ok_or_else(|| {
                            PublisherError::schema(path, "attribute is not part of the profile schema")
                        })?;
                }
                node
            }
        };

        match container.get_mut(key) {
            None => Err(PublisherError::schema(
                path,
                "attribute is not part of the profile schema",
            )),
            Some(FlatValue::Map(_)) if !matches!(value, FlatValue::Map(_)) => Err(
                PublisherError::schema(path, "attempted to overwrite profile dictionary with single value"),
            ),
            Some(slot) => {
                *slot = value;
                Ok(())
            }
        }
    }

    /// Set several values; stops at the first error.
    pub fn update<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FlatValue>,
    {
        for (key, value) in entries {
            self.set_path(key.as_ref(), value)?;
        }
        Ok(())
    }

    pub fn flat(&self) -> &FlatMap {
        &self.flat
    }

    pub fn raw(&self) -> &RawTree {
        &self.raw
    }

    /// Whether the profile holds nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        is_deletable(&self.flat)
    }

    /// Every change recorded since load (or since the last successful
    /// publish), in the order signing found them.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Bring the raw tree up to date with the flat view, signing every
    /// attribute that changed.
    ///
    /// A supplied `display_level` is remembered for later signs of this
    /// profile; it only applies to attributes that do not carry one yet.
    ///
    /// If the pass fails part-way, attributes already signed keep their new
    /// values and stay recorded in [`Profile::notifications`], so a later
    /// successful publish still submits them.
    pub fn sign(&mut self, publisher: &Publisher, display_level: Option<DisplayLevel>) -> Result<()> {
        if display_level.is_some() {
            self.display_level = display_level;
        }

        let ctx = publisher.write_context(self.display_level);
        tree::synchronize(&self.flat, &mut self.raw, &ctx, &mut self.notifications)?;
        self.flat = tree::flatten(&self.raw);

        Ok(())
    }

    /// Sign, log the changes, and submit the document if anything changed.
    ///
    /// Submission is skipped when nothing changed, when `dry_run` is set, or
    /// when the publisher is configured for dry runs. A refused or failed
    /// submission is reported as [`PublishOutcome::Rejected`], not as an
    /// error.
    pub fn publish(
        &mut self,
        publisher: &Publisher,
        sink: &dyn ProfileSink,
        display_level: Option<DisplayLevel>,
        dry_run: bool,
    ) -> Result<PublishOutcome> {
        self.sign(publisher, display_level)?;

        let name = self.display_name();
        let mut pending = self.notifications.clone();
        pending.sort();
        for notification in &pending {
            log::info!(
                "Updating {} on {}: {}",
                notification.attribute,
                name,
                notification.description
            );
        }

        if pending.is_empty() {
            log::debug!("Skipping publication of {name} (no changes)");
            return Ok(PublishOutcome::Unchanged);
        }

        if dry_run || publisher.is_dry_run() {
            log::info!("Dry run: not publishing {name}");
            return Ok(PublishOutcome::DryRun);
        }

        match sink.submit_profile(&self.to_document()?) {
            Ok(true) => {
                log::debug!("Successfully updated profile {name}");
                self.notifications.clear();
                Ok(PublishOutcome::Published)
            }
            Ok(false) => {
                log::error!("Unable to update profile {name}");
                Ok(PublishOutcome::Rejected)
            }
            Err(e) => {
                log::error!("Unable to update profile {name}: {e}");
                Ok(PublishOutcome::Rejected)
            }
        }
    }

    /// The raw tree as a provider document.
    pub fn to_document(&self) -> Result<Value> {
        self.raw.to_document()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string_pretty(&self.flat) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}
