//! In-memory profile store for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{PublisherError, Result};
use crate::provider::{validate_submission, IdentityKey, ProfileSink, ProfileSource};

#[derive(Debug, Default)]
struct Inner {
    profiles: BTreeMap<String, Value>,
    submitted: Vec<Value>,
}

/// Profiles keyed by user id behind a mutex.
///
/// Every accepted submission is also kept in arrival order, so callers can
/// check exactly what was published.
#[derive(Debug)]
pub struct MemoryStore {
    skeleton: Value,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(skeleton: Value) -> Self {
        Self {
            skeleton,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seed a profile without counting it as a submission.
    ///
    /// Documents without a user id are ignored.
    pub fn insert(&self, document: Value) {
        if let Some(user_id) = document["user_id"]["value"].as_str().map(str::to_string) {
            self.lock().profiles.insert(user_id, document);
        }
    }

    /// Number of accepted submissions.
    pub fn submissions(&self) -> usize {
        self.lock().submitted.len()
    }

    /// Accepted submissions, oldest first.
    pub fn submitted(&self) -> Vec<Value> {
        self.lock().submitted.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the maps half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProfileSource for MemoryStore {
    fn fetch_profile(&self, key: Option<&IdentityKey>) -> Result<Value> {
        let Some(key) = key else {
            return Ok(self.skeleton.clone());
        };

        self.lock()
            .profiles
            .values()
            .find(|doc| key.matches(doc))
            .cloned()
            .ok_or_else(|| {
                PublisherError::NotFound(format!("no profile with {} {key}", key.attribute()))
            })
    }
}

impl ProfileSink for MemoryStore {
    fn submit_profile(&self, document: &Value) -> Result<bool> {
        let user_id = validate_submission(document)?.to_string();
        let mut inner = self.lock();
        inner.profiles.insert(user_id, document.clone());
        inner.submitted.push(document.clone());
        Ok(true)
    }
}
