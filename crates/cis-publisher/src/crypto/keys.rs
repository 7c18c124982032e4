//! Ed25519 publisher key pair.
//!
//! The publisher signs every changed attribute with one process-wide key.
//! Keys are exchanged as base64 of the 32-byte seed.

use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{PublisherError, Result};

/// An Ed25519 key pair for signing operations.
///
/// The signing key is zeroized on drop to prevent private key leakage.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from raw signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from a base64-encoded 32-byte seed.
    pub fn from_base64_seed(encoded: &str) -> Result<Self> {
        let mut decoded =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded.trim())
                .map_err(|e| PublisherError::InvalidKey(format!("invalid base64 seed: {e}")))?;

        let result = <[u8; 32]>::try_from(decoded.as_slice())
            .map(|seed| Self::from_signing_key_bytes(&seed))
            .map_err(|_| PublisherError::InvalidKey("signing key seed must be 32 bytes".into()));
        decoded.zeroize();
        result
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Return the seed as base64. Caller must not log it.
    pub fn seed_base64(&self) -> String {
        let mut bytes = self.signing_key.to_bytes();
        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
        bytes.zeroize();
        encoded
    }

    /// Short key identifier: hex of the first 8 bytes of SHA-256(public key).
    pub fn key_id(&self) -> String {
        key_id(&self.verifying_key)
    }
}

/// Compute the key identifier for any verifying key.
pub fn key_id(key: &VerifyingKey) -> String {
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(&hash[..8])
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}
