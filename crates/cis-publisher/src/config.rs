//! Publisher configuration.
//!
//! The signing key is optional at load time: profiles can be read and
//! inspected without it, and only producing a signature requires it.

use crate::crypto::{Ed25519KeyPair, PublisherSigner};
use crate::error::Result;

/// Name used when none is configured.
pub const DEFAULT_PUBLISHER_NAME: &str = "ldap";

/// Process-wide publisher settings.
#[derive(Clone)]
pub struct PublisherConfig {
    /// Written into the `publisher.name` of every signature.
    pub publisher_name: String,
    /// Base64 Ed25519 seed.
    pub signing_key: Option<String>,
    /// Never submit, only report what would change.
    pub dry_run: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            publisher_name: DEFAULT_PUBLISHER_NAME.to_string(),
            signing_key: None,
            dry_run: false,
        }
    }
}

impl PublisherConfig {
    /// Decode the configured signing key, if any.
    pub fn signer(&self) -> Result<Option<PublisherSigner>> {
        self.signing_key
            .as_deref()
            .map(|seed| {
                Ed25519KeyPair::from_base64_seed(seed)
                    .map(|kp| PublisherSigner::new(self.publisher_name.clone(), kp))
            })
            .transpose()
    }
}

impl std::fmt::Debug for PublisherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherConfig")
            .field("publisher_name", &self.publisher_name)
            .field(
                "signing_key",
                &self.signing_key.as_ref().map(|_| "<redacted>"),
            )
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
