//! Error types for team operations.

use thiserror::Error;

/// Errors that can occur while building, loading or querying a team.
#[derive(Debug, Error)]
pub enum TeamError {
    /// The acting user lacks the rights for this action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("member not found: {0}")]
    MemberNotFound(String),

    #[error("member already exists: {0}")]
    MemberExists(String),

    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("role already exists: {0}")]
    RoleExists(String),

    #[error("invitation not found: {0}")]
    InvitationNotFound(String),

    #[error("invitation has been revoked: {0}")]
    InvitationRevoked(String),

    #[error("invitation has expired: {0}")]
    InvitationExpired(String),

    #[error("invitation has no uses left: {0}")]
    InvitationUsedUp(String),

    /// The proof was not signed by the invitation key.
    #[error("invalid proof of invitation: {0}")]
    InvalidProof(String),

    /// No key for the requested scope is available locally.
    #[error("no key available for scope {0}")]
    MissingKey(String),

    /// A link payload does not make sense at its position in the graph.
    #[error("invalid team action: {0}")]
    InvalidAction(String),

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("core error: {0}")]
    CoreError(#[from] sigchain_core::CoreError),

    #[error("validation error: {0}")]
    ValidationError(#[from] sigchain_core::ValidationError),
}

/// Result type for team operations.
pub type Result<T> = std::result::Result<T, TeamError>;

/// Encode a value as CBOR.
pub(crate) fn to_cbor<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| TeamError::SerializationError(e.to_string()))?;
    Ok(buf)
}

/// Decode a value from CBOR.
pub(crate) fn from_cbor<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| TeamError::SerializationError(e.to_string()))
}
