//! Keyring: the symmetric scope keys held locally.

use serde::{Deserialize, Serialize};
use std::fmt;

use sigchain_core::UserId;

use crate::crypto::EncryptionKey;

/// What a symmetric key protects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyScope {
    /// Shared by every member of the team.
    Team,
    /// Shared by the members of one role.
    Role(String),
    /// Private to one user.
    User(UserId),
}

impl KeyScope {
    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(name.into())
    }

    /// Stable byte label, used as key-derivation context.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KeyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyScope::Team => f.write_str("team"),
            KeyScope::Role(name) => write!(f, "role:{}", name),
            KeyScope::User(id) => write!(f, "user:{}", id),
        }
    }
}

/// One key in the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedKey {
    pub scope: KeyScope,
    pub generation: u32,
    pub key: EncryptionKey,
}

/// The set of scope keys available to the local user.
///
/// Holds at most one key per scope: the newest generation seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyring {
    keys: Vec<ScopedKey>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, keeping whichever generation is newer.
    pub fn insert(&mut self, scope: KeyScope, generation: u32, key: EncryptionKey) {
        match self.keys.iter_mut().find(|k| k.scope == scope) {
            Some(existing) if existing.generation > generation => {}
            Some(existing) => {
                existing.generation = generation;
                existing.key = key;
            }
            None => self.keys.push(ScopedKey {
                scope,
                generation,
                key,
            }),
        }
    }

    pub fn get(&self, scope: &KeyScope) -> Option<&ScopedKey> {
        self.keys.iter().find(|k| &k.scope == scope)
    }

    pub fn contains(&self, scope: &KeyScope) -> bool {
        self.get(scope).is_some()
    }

    /// Merge every key from `other` into this keyring.
    pub fn merge(&mut self, other: &Keyring) {
        for key in &other.keys {
            self.insert(key.scope.clone(), key.generation, key.key.clone());
        }
    }

    /// A keyring holding only the team-wide key, suitable for handing to a
    /// joining member.
    pub fn team_only(&self) -> Keyring {
        Keyring {
            keys: self
                .keys
                .iter()
                .filter(|k| k.scope == KeyScope::Team)
                .cloned()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopedKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_newest_generation() {
        let mut keyring = Keyring::new();
        let old = EncryptionKey::generate();
        let new = EncryptionKey::generate();

        keyring.insert(KeyScope::Team, 1, new.clone());
        keyring.insert(KeyScope::Team, 0, old);

        let key = keyring.get(&KeyScope::Team).unwrap();
        assert_eq!(key.generation, 1);
        assert_eq!(key.key, new);
        assert_eq!(keyring.len(), 1);
    }

    #[test]
    fn test_merge_and_team_only() {
        let mut a = Keyring::new();
        a.insert(KeyScope::Team, 0, EncryptionKey::generate());

        let mut b = Keyring::new();
        b.insert(KeyScope::role("admin"), 0, EncryptionKey::generate());

        a.merge(&b);
        assert!(a.contains(&KeyScope::role("admin")));
        assert_eq!(a.len(), 2);

        let team = a.team_only();
        assert_eq!(team.len(), 1);
        assert!(team.contains(&KeyScope::Team));
    }

    #[test]
    fn test_scope_labels() {
        assert_eq!(KeyScope::Team.label(), "team");
        assert_eq!(KeyScope::role("member").label(), "role:member");
        assert_eq!(KeyScope::User(UserId::from("u1")).label(), "user:u1");
    }
}
