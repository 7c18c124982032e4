//! Attribute signatures.
//!
//! Each signed attribute carries a signature block whose `publisher` entry
//! is a compact JWS (`header.payload.signature`, base64url without padding)
//! over the attribute's canonical JSON. The `additional` list is kept for
//! wire compatibility and left unsigned.

use ed25519_dalek::{Signature as Ed25519Signature, Signer, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use super::keys::{key_id, Ed25519KeyPair};
use crate::attribute::SignableAttribute;
use crate::error::{PublisherError, Result};

/// JWS algorithm name for Ed25519.
pub const JWS_ALGORITHM: &str = "EdDSA";
const JWS_TYPE: &str = "JWS";

/// One entry of a signature block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub alg: String,
    pub name: Option<String>,
    pub typ: String,
    pub value: String,
}

/// The signature block stored on every signed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    pub publisher: SignatureEntry,
    pub additional: Vec<SignatureEntry>,
}

/// Capability to sign an attribute's canonical bytes.
///
/// Implementations hold key material for the life of the process and must
/// be shareable across worker threads.
pub trait LeafSigner: Send + Sync {
    fn sign_leaf(&self, canonical: &[u8]) -> Result<SignatureBlock>;
}

#[derive(Serialize, Deserialize)]
struct JwsHeader {
    alg: String,
    kid: String,
    typ: String,
}

/// Signs attributes on behalf of a named publisher.
pub struct PublisherSigner {
    name: String,
    key_pair: Ed25519KeyPair,
}

impl PublisherSigner {
    pub fn new(name: impl Into<String>, key_pair: Ed25519KeyPair) -> Self {
        Self {
            name: name.into(),
            key_pair,
        }
    }

    /// Publisher name written into every signature block.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.key_pair.verifying_key()
    }
}

impl std::fmt::Debug for PublisherSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherSigner")
            .field("name", &self.name)
            .field("kid", &self.key_pair.key_id())
            .finish()
    }
}

impl LeafSigner for PublisherSigner {
    fn sign_leaf(&self, canonical: &[u8]) -> Result<SignatureBlock> {
        let value = sign_compact(&self.key_pair, canonical)?;
        Ok(SignatureBlock {
            publisher: SignatureEntry {
                alg: JWS_ALGORITHM.to_string(),
                name: Some(self.name.clone()),
                typ: JWS_TYPE.to_string(),
                value,
            },
            additional: vec![SignatureEntry {
                alg: JWS_ALGORITHM.to_string(),
                name: None,
                typ: JWS_TYPE.to_string(),
                value: String::new(),
            }],
        })
    }
}

fn b64url(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

fn b64url_decode(s: &str) -> Result<Vec<u8>> {
    base64::Engine::decode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, s)
        .map_err(|e| PublisherError::InvalidKey(format!("invalid base64url segment: {e}")))
}

/// Produce a compact JWS over `payload`.
pub fn sign_compact(key_pair: &Ed25519KeyPair, payload: &[u8]) -> Result<String> {
    let header = JwsHeader {
        alg: JWS_ALGORITHM.to_string(),
        kid: key_pair.key_id(),
        typ: JWS_TYPE.to_string(),
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| PublisherError::SerializationError(e.to_string()))?;

    let signing_input = format!("{}.{}", b64url(&header_json), b64url(payload));
    let sig = key_pair.signing_key().sign(signing_input.as_bytes());

    Ok(format!("{signing_input}.{}", b64url(&sig.to_bytes())))
}

/// Verify a compact JWS and return its decoded payload.
pub fn verify_compact(verifying_key: &VerifyingKey, token: &str) -> Result<Vec<u8>> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(PublisherError::SignatureInvalid);
    };

    let header: JwsHeader = serde_json::from_slice(&b64url_decode(header_b64)?)
        .map_err(|e| PublisherError::SerializationError(format!("jws header: {e}")))?;
    if header.alg != JWS_ALGORITHM || header.kid != key_id(verifying_key) {
        return Err(PublisherError::SignatureInvalid);
    }

    let sig_array: [u8; 64] = b64url_decode(sig_b64)?
        .try_into()
        .map_err(|_| PublisherError::InvalidKey("signature must be 64 bytes".into()))?;
    let signature = Ed25519Signature::from_bytes(&sig_array);

    let signing_input = format!("{header_b64}.{payload_b64}");
    verifying_key
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|_| PublisherError::SignatureInvalid)?;

    b64url_decode(payload_b64)
}

/// Check that `attribute` carries a publisher signature by `verifying_key`
/// over its current canonical bytes.
pub fn verify_leaf_signature(
    attribute: &SignableAttribute,
    verifying_key: &VerifyingKey,
) -> Result<()> {
    let token = attribute
        .signature()
        .and_then(|sig| sig["publisher"]["value"].as_str())
        .filter(|token| !token.is_empty())
        .ok_or(PublisherError::SignatureInvalid)?;

    if verify_compact(verifying_key, token)? != attribute.canonical_bytes()? {
        return Err(PublisherError::SignatureInvalid);
    }
    Ok(())
}
