//! Error types for the sigchain core.

use thiserror::Error;

use crate::types::LinkId;

/// Core errors that can occur while encoding, decoding or verifying links.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("invalid team graph: {0}")]
    InvalidGraph(#[from] ValidationError),
}

/// Validation errors for link structure, signatures and graph position.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature verification failed")]
    SignatureFailed,

    #[error("payload hash does not match header")]
    PayloadHashMismatch,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid sequence number: expected {expected}, got {got}")]
    InvalidSequence { expected: u64, got: u64 },

    #[error("invalid prev link: expected {expected:?}, got {got:?}")]
    InvalidPrev {
        expected: Option<LinkId>,
        got: Option<LinkId>,
    },

    #[error("team graph must start with a root link")]
    MissingRoot,

    #[error("root link is only allowed at seq 1")]
    MisplacedRoot,

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => {
                ValidationError::SignatureFailed
            }
            CoreError::EncodingError(msg) | CoreError::DecodingError(msg) => {
                ValidationError::StructuralError(msg)
            }
            CoreError::InvalidGraph(inner) => inner,
        }
    }
}
