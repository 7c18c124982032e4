//! Cryptographic primitives for the CIS publisher.
//!
//! This module provides:
//! - Ed25519 publisher key pairs
//! - Compact JWS signing and verification of attribute payloads

pub mod keys;
pub mod signing;

pub use keys::Ed25519KeyPair;
pub use signing::{
    verify_leaf_signature, LeafSigner, PublisherSigner, SignatureBlock, SignatureEntry,
};
