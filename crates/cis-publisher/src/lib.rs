//! CIS publisher: a flat, signable view over partially-signed identity
//! profiles.
//!
//! Profiles arrive as nested documents whose leaves are individually
//! signed attributes. [`Profile`] projects such a document into a plain
//! map for editing, and on sign projects the edits back, re-signing each
//! changed attribute with the publisher's key and recording what changed.

pub mod attribute;
pub mod config;
pub mod crypto;
pub mod error;
pub mod profile;
pub mod provider;
pub mod publisher;
pub mod storage;
pub mod sync;
pub mod time;
pub mod tree;

#[cfg(test)]
mod fixtures;

// Re-export primary types
pub use attribute::{AttributeValue, ChangeDescription, DisplayLevel, SignableAttribute};
pub use config::PublisherConfig;
pub use crypto::{Ed25519KeyPair, LeafSigner, PublisherSigner};
pub use error::{PublisherError, Result, SigningConfigError};
pub use profile::{is_deletable, Notification, Profile, PublishOutcome};
pub use provider::{IdentityKey, ProfileSink, ProfileSource};
pub use publisher::Publisher;
pub use storage::{DirectoryStore, MemoryStore};
pub use sync::{LdapDump, LdapRecord, SyncOutcome, SyncReport};
pub use tree::{FlatMap, FlatValue, RawNode, RawTree};
