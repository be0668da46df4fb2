//! Encrypted and signed envelopes.
//!
//! An [`EncryptedEnvelope`] carries data encrypted with a scope key; the
//! scope and generation tell the recipient which key to use. A
//! [`SignedEnvelope`] carries plaintext contents signed by a team member.

use serde::{Deserialize, Serialize};

use sigchain_core::{Ed25519PublicKey, Ed25519Signature, Keypair, UserId};

use crate::crypto::EncryptionNonce;
use crate::error::{from_cbor, to_cbor, Result};
use crate::keyring::{KeyScope, ScopedKey};

/// Data encrypted for everyone holding a scope key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub scope: KeyScope,
    pub generation: u32,
    pub nonce: EncryptionNonce,
    /// The encrypted data (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Encrypt plaintext with a scope key.
    pub fn seal(plaintext: &[u8], key: &ScopedKey) -> Result<Self> {
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.key.encrypt(plaintext, &nonce)?;

        Ok(Self {
            scope: key.scope.clone(),
            generation: key.generation,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt with the matching scope key.
    pub fn open(&self, key: &ScopedKey) -> Result<Vec<u8>> {
        key.key.decrypt(&self.ciphertext, &self.nonce)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        from_cbor(bytes)
    }
}

/// Who signed a [`SignedEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureAuthor {
    pub user_id: UserId,
    pub user_name: String,
    pub signing_key: Ed25519PublicKey,
}

/// Contents plus a detached signature by a team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub contents: Vec<u8>,
    pub signature: Ed25519Signature,
    pub author: SignatureAuthor,
}

impl SignedEnvelope {
    pub fn sign(contents: impl Into<Vec<u8>>, author: SignatureAuthor, keypair: &Keypair) -> Self {
        let contents = contents.into();
        let signature = keypair.sign(&contents);
        Self {
            contents,
            signature,
            author,
        }
    }

    /// Check the signature against the key named in `author`.
    ///
    /// Does not check that the key belongs to a team member.
    pub fn signature_valid(&self) -> bool {
        self.author
            .signing_key
            .verify(&self.contents, &self.signature)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionKey;

    fn team_key() -> ScopedKey {
        ScopedKey {
            scope: KeyScope::Team,
            generation: 0,
            key: EncryptionKey::generate(),
        }
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = team_key();
        let envelope = EncryptedEnvelope::seal(b"hello, encrypted team!", &key).unwrap();

        assert_eq!(envelope.scope, KeyScope::Team);
        assert_eq!(envelope.open(&key).unwrap(), b"hello, encrypted team!");
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = EncryptedEnvelope::seal(b"test", &team_key()).unwrap();

        let bytes = envelope.to_bytes().unwrap();
        assert_eq!(EncryptedEnvelope::from_bytes(&bytes).unwrap(), envelope);
    }

    #[test]
    fn test_wrong_key_fails() {
        let envelope = EncryptedEnvelope::seal(b"secret", &team_key()).unwrap();
        assert!(envelope.open(&team_key()).is_err());
    }

    #[test]
    fn test_signed_envelope() {
        let keypair = Keypair::generate();
        let author = SignatureAuthor {
            user_id: UserId::from("alice"),
            user_name: "alice".into(),
            signing_key: keypair.public_key(),
        };

        let mut envelope = SignedEnvelope::sign(b"ciphertext".to_vec(), author, &keypair);
        assert!(envelope.signature_valid());

        envelope.contents = b"tampered".to_vec();
        assert!(!envelope.signature_valid());
    }
}
