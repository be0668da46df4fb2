//! Users, devices and their keysets.
//!
//! Every user and device carries a signing key (Ed25519) and an encryption
//! key (X25519). The `*WithSecrets` variants hold private material and only
//! ever live in the local user context; the redacted variants are what gets
//! written into the team graph.

use serde::{Deserialize, Serialize};

use sigchain_core::{Ed25519PublicKey, Keypair, UserId};

use crate::crypto::{X25519PublicKey, X25519StaticSecret};

/// Public half of a keyset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyset {
    pub signature: Ed25519PublicKey,
    pub encryption: X25519PublicKey,
    pub generation: u32,
}

/// A keyset including its secret keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysetWithSecrets {
    signing: Keypair,
    encryption_secret: [u8; 32],
    pub generation: u32,
}

impl KeysetWithSecrets {
    /// Generate a fresh random keyset at generation 0.
    pub fn generate() -> Self {
        Self {
            signing: Keypair::generate(),
            encryption_secret: X25519StaticSecret::generate().to_bytes(),
            generation: 0,
        }
    }

    pub fn signing_keypair(&self) -> &Keypair {
        &self.signing
    }

    pub fn encryption_secret(&self) -> X25519StaticSecret {
        X25519StaticSecret::from_bytes(self.encryption_secret)
    }

    /// Strip the secrets.
    pub fn redact(&self) -> Keyset {
        Keyset {
            signature: self.signing.public_key(),
            encryption: self.encryption_secret().public_key(),
            generation: self.generation,
        }
    }
}

impl std::fmt::Debug for KeysetWithSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeysetWithSecrets")
            .field("keys", &self.redact())
            .finish()
    }
}

/// A user as seen by other team members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub user_name: String,
    pub keys: Keyset,
}

/// The local user, including secret keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithSecrets {
    pub user_id: UserId,
    pub user_name: String,
    pub keys: KeysetWithSecrets,
}

impl UserWithSecrets {
    pub fn redact(&self) -> User {
        User {
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            keys: self.keys.redact(),
        }
    }
}

/// A device as seen by other team members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub user_id: UserId,
    pub device_name: String,
    pub keys: Keyset,
}

/// The local device, including secret keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceWithSecrets {
    pub user_id: UserId,
    pub device_name: String,
    pub keys: KeysetWithSecrets,
}

impl DeviceWithSecrets {
    pub fn redact(&self) -> Device {
        Device {
            user_id: self.user_id.clone(),
            device_name: self.device_name.clone(),
            keys: self.keys.redact(),
        }
    }
}

/// The identity a team instance acts as. Persisted next to the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUserContext {
    pub user: UserWithSecrets,
    pub device: DeviceWithSecrets,
}

/// Create a user with fresh keys. A random id is generated when `user_id` is None.
pub fn create_user(user_name: impl Into<String>, user_id: Option<UserId>) -> UserWithSecrets {
    UserWithSecrets {
        user_id: user_id.unwrap_or_else(UserId::generate),
        user_name: user_name.into(),
        keys: KeysetWithSecrets::generate(),
    }
}

/// Create a device with fresh keys for `user_id`.
pub fn create_device(user_id: UserId, device_name: impl Into<String>) -> DeviceWithSecrets {
    DeviceWithSecrets {
        user_id,
        device_name: device_name.into(),
        keys: KeysetWithSecrets::generate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_generates_id() {
        let user = create_user("alice", None);
        assert_eq!(user.user_name, "alice");
        assert!(!user.user_id.as_str().is_empty());

        let explicit = create_user("bob", Some(UserId::from("bob-id")));
        assert_eq!(explicit.user_id.as_str(), "bob-id");
    }

    #[test]
    fn test_redact_keeps_public_keys() {
        let user = create_user("alice", None);
        let redacted = user.redact();

        assert_eq!(redacted.user_id, user.user_id);
        assert_eq!(
            redacted.keys.signature,
            user.keys.signing_keypair().public_key()
        );
        assert_eq!(
            redacted.keys.encryption,
            user.keys.encryption_secret().public_key()
        );
    }

    #[test]
    fn test_context_serde_roundtrip() {
        let user = create_user("alice", None);
        let device = create_device(user.user_id.clone(), "laptop");
        let context = LocalUserContext { user, device };

        let mut buf = Vec::new();
        ciborium::into_writer(&context, &mut buf).unwrap();
        let restored: LocalUserContext = ciborium::from_reader(buf.as_slice()).unwrap();

        assert_eq!(context, restored);
        assert_eq!(restored.device.redact().device_name, "laptop");
    }
}
