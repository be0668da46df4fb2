//! Lockboxes: scope keys sealed to one member.
//!
//! When a member gains access to a scope (joining the team, being added to
//! a role), the author seals the scope key to the member's X25519 key and
//! records the lockbox in the graph. Only the recipient can open it.

use serde::{Deserialize, Serialize};

use sigchain_core::UserId;

use crate::crypto::{
    EncryptionKey, EncryptionNonce, EphemeralKeyPair, X25519PublicKey, X25519StaticSecret,
};
use crate::error::{Result, TeamError};
use crate::keyring::{KeyScope, ScopedKey};

/// A scope key encrypted for a single recipient.
///
/// The key is encrypted using ephemeral X25519 ECDH + ChaCha20-Poly1305.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockbox {
    /// Which key is inside.
    pub scope: KeyScope,
    pub generation: u32,

    /// The member the lockbox is addressed to.
    pub recipient: UserId,
    pub recipient_key: X25519PublicKey,

    /// Ephemeral X25519 public key (sender's side of ECDH).
    pub ephemeral_public: X25519PublicKey,

    /// The scope key, encrypted with the derived shared secret.
    pub encrypted_key: Vec<u8>,

    pub nonce: EncryptionNonce,
}

impl Lockbox {
    /// Seal `key` to a recipient.
    pub fn seal(
        key: &ScopedKey,
        recipient: UserId,
        recipient_key: &X25519PublicKey,
    ) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key();

        let wrap_key = ephemeral
            .diffie_hellman(recipient_key)
            .derive_encryption_key(key.scope.label().as_bytes());

        let nonce = EncryptionNonce::generate();
        let encrypted_key = wrap_key.encrypt(key.key.as_bytes(), &nonce)?;

        Ok(Self {
            scope: key.scope.clone(),
            generation: key.generation,
            recipient,
            recipient_key: *recipient_key,
            ephemeral_public,
            encrypted_key,
            nonce,
        })
    }

    /// Open the lockbox with the recipient's secret key.
    pub fn open(&self, recipient_secret: &X25519StaticSecret) -> Result<ScopedKey> {
        let wrap_key = recipient_secret
            .diffie_hellman(&self.ephemeral_public)
            .derive_encryption_key(self.scope.label().as_bytes());

        let key_bytes = wrap_key.decrypt(&self.encrypted_key, &self.nonce)?;
        let arr: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| {
            TeamError::DecryptionError(format!(
                "invalid key length: expected 32, got {}",
                key_bytes.len()
            ))
        })?;

        Ok(ScopedKey {
            scope: self.scope.clone(),
            generation: self.generation,
            key: EncryptionKey::from_bytes(arr),
        })
    }

    /// Whether this lockbox can be opened with `secret`.
    pub fn is_for(&self, secret: &X25519StaticSecret) -> bool {
        self.recipient_key == secret.public_key()
    }
}
