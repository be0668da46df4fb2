//! Error types for the sigchain registry and services.

use sigchain_store::StoreError;
use sigchain_team::TeamError;
use thiserror::Error;

/// Errors that can occur during registry and service operations.
#[derive(Debug, Error)]
pub enum SigChainError {
    /// A chain with this name is already registered.
    #[error("chain already exists: {0}")]
    DuplicateChain(String),

    /// No chain with this name is registered (or stored).
    #[error("chain not found: {0}")]
    NotFound(String),

    /// No chain is currently active.
    #[error("no active chain")]
    NoActiveChain,

    /// The team name cannot be used as a registry key.
    #[error("invalid chain name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A service was called with arguments it cannot act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A signed payload failed verification.
    #[error("signature could not be verified: {0}")]
    InvalidSignature(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Team graph or key error.
    #[error("team error: {0}")]
    Team(#[from] TeamError),

    /// A stored context or keyring could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// The process-wide registry was initialized twice.
    #[error("sigchain registry already initialized")]
    AlreadyInitialized,

    /// The process-wide registry was used before initialization.
    #[error("sigchain registry has not been initialized")]
    NotInitialized,
}

/// Result type for sigchain operations.
pub type Result<T> = std::result::Result<T, SigChainError>;
