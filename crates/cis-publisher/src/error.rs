//! Error types for the CIS publisher.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material is never included in error messages.

/// Signing could not proceed because the caller did not supply what the
/// leaf needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningConfigError {
    #[error("attempted to sign {attribute} without selecting a display level")]
    MissingDisplayLevel { attribute: String },

    #[error("unable to load publisher signing key")]
    MissingSigningKey,
}

/// Publisher error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum PublisherError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Profile is inactive: {0}")]
    InactiveProfile(String),

    #[error("Schema violation at {path}: {reason}")]
    SchemaViolation { path: String, reason: String },

    #[error("Signing configuration error: {0}")]
    SigningConfig(#[from] SigningConfigError),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublisherError {
    /// Build a schema violation for the attribute at `path`.
    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error should stop a whole batch run rather than a
    /// single profile. Only a missing signing key qualifies: every other
    /// profile would fail the same way.
    pub fn aborts_run(&self) -> bool {
        matches!(
            self,
            Self::SigningConfig(SigningConfigError::MissingSigningKey)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, PublisherError>;
