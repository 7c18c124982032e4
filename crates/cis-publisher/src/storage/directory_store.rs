//! Filesystem-backed profile store.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{PublisherError, Result};
use crate::provider::{validate_submission, IdentityKey, ProfileSink, ProfileSource};

const SKELETON_FILE: &str = "skeleton.json";
const PROFILES_DIR: &str = "profiles";

// ── DirectoryStore ────────────────────────────────────────────────────────────

/// Profiles stored as one JSON document per user.
///
/// Lookups by email or username scan every stored profile. The store is
/// safe for concurrent readers and writers within one process: each write
/// goes through its own temp file and lands atomically, so concurrent
/// writes of the same user leave exactly one of them in place.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open a store rooted at `root`, creating its directories if needed.
    ///
    /// # Errors
    ///
    /// Returns `PublisherError::Io` if the directories cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(PROFILES_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace the skeleton profile.
    pub fn save_skeleton(&self, document: &Value) -> Result<()> {
        write_document(&self.root.join(SKELETON_FILE), document)
    }

    /// Read the skeleton profile.
    ///
    /// # Errors
    ///
    /// `NotFound` when no skeleton has been saved.
    pub fn load_skeleton(&self) -> Result<Value> {
        let path = self.root.join(SKELETON_FILE);
        if !path.exists() {
            return Err(PublisherError::NotFound(format!(
                "no skeleton profile in {}",
                self.root.display()
            )));
        }
        read_document(&path)
    }

    /// Store a profile under its `user_id`, overwriting any previous copy.
    ///
    /// # Errors
    ///
    /// `SchemaViolation` if the document lacks a user id, primary email or
    /// primary username.
    pub fn save(&self, document: &Value) -> Result<PathBuf> {
        let user_id = validate_submission(document)?;
        let path = self.profile_path(user_id);
        write_document(&path, document)?;
        Ok(path)
    }

    /// Load a profile by user id.
    pub fn load(&self, user_id: &str) -> Result<Value> {
        let path = self.profile_path(user_id);
        if !path.exists() {
            return Err(PublisherError::NotFound(format!(
                "profile not found: {user_id}"
            )));
        }
        read_document(&path)
    }

    /// User ids of every stored profile, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = self
            .documents()?
            .into_iter()
            .filter_map(|doc| doc["user_id"]["value"].as_str().map(str::to_string))
            .collect::<Vec<_>>();
        ids.sort();
        Ok(ids)
    }

    /// Find the one stored profile `key` selects.
    pub fn find(&self, key: &IdentityKey) -> Result<Value> {
        if let IdentityKey::UserId(user_id) = key {
            return self.load(user_id);
        }

        let mut matches = self
            .documents()?
            .into_iter()
            .filter(|doc| key.matches(doc))
            .collect::<Vec<_>>();

        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(PublisherError::NotFound(format!(
                "no profile with {} {key}",
                key.attribute()
            ))),
            n => Err(PublisherError::NotFound(format!(
                "{n} profiles share {} {key}",
                key.attribute()
            ))),
        }
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.root
            .join(PROFILES_DIR)
            .join(format!("{}.json", file_stem(user_id)))
    }

    fn documents(&self) -> Result<Vec<Value>> {
        let mut documents = Vec::new();
        for entry in std::fs::read_dir(self.root.join(PROFILES_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                documents.push(read_document(&path)?);
            }
        }
        Ok(documents)
    }
}

impl ProfileSource for DirectoryStore {
    fn fetch_profile(&self, key: Option<&IdentityKey>) -> Result<Value> {
        match key {
            Some(key) => self.find(key),
            None => self.load_skeleton(),
        }
    }
}

impl ProfileSink for DirectoryStore {
    fn submit_profile(&self, document: &Value) -> Result<bool> {
        let path = self.save(document)?;
        log::debug!("Stored profile at {}", path.display());
        Ok(true)
    }
}

/// User ids contain characters like `|`; keep the safe ones and
/// percent-encode the rest.
fn file_stem(user_id: &str) -> String {
    let mut stem = String::with_capacity(user_id.len());
    for byte in user_id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'@' => {
                stem.push(byte as char)
            }
            _ => stem.push_str(&format!("%{byte:02X}")),
        }
    }
    stem
}

fn read_document(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        PublisherError::InvalidFileFormat(format!(
            "failed to parse profile file {}: {e}",
            path.display()
        ))
    })
}

fn write_document(path: &Path, document: &Value) -> Result<()> {
    let json = serde_json::to_vec_pretty(document)
        .map_err(|e| PublisherError::SerializationError(e.to_string()))?;
    write_atomic(path, &json)
}

/// Write `data` to `path` through a uniquely named sibling temp file and a
/// rename, so readers never see a partial document.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
