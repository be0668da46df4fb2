//! SigChain: one named team chain and the services that act on it.
//!
//! A `SigChain` is built in a single step by one of its constructors and is
//! complete from then on. Domain services are cheap borrowed views created
//! on demand; they all read and write the same [`Team`] through an internal
//! lock, so a change made through one holder of an `Arc<SigChain>` is seen
//! by every other holder.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use sigchain_store::StoredChain;
use sigchain_team::{Keyring, LocalUserContext, PermissionsMap, Team, MEMBER};

use crate::error::{Result, SigChainError};
use crate::services::{
    ChannelService, CryptoService, DeviceService, InviteService, RoleService, UserService,
};

/// A team chain bound to the local user.
pub struct SigChain {
    /// Registry key. Equal to the team name and never changes.
    name: String,
    team: RwLock<Team>,
}

impl SigChain {
    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Found a new team with a freshly generated user as its admin.
    ///
    /// The founder is also placed in the `member` role.
    pub fn create(team_name: &str, user_name: &str) -> Result<Self> {
        let context = UserService::create_context(user_name, None);
        let founder = context.user.user_id.clone();

        let chain = Self::from_team(Team::create(team_name, context)?);
        chain
            .roles()
            .create_with_members(MEMBER, &[founder], PermissionsMap::new(), false)?;

        info!(team_name = %chain.name, user_name, "created sigchain");
        Ok(chain)
    }

    /// Wrap an already constructed team.
    pub fn from_team(team: Team) -> Self {
        Self {
            name: team.team_name().to_string(),
            team: RwLock::new(team),
        }
    }

    /// Load a serialized team for an existing local user.
    pub fn load(serialized_team: &[u8], context: LocalUserContext, keyring: Keyring) -> Result<Self> {
        Ok(Self::from_team(Team::load(serialized_team, context, keyring)?))
    }

    /// Load a serialized team and join it with the keys handed over.
    pub fn join(context: LocalUserContext, serialized_team: &[u8], keyring: &Keyring) -> Result<Self> {
        let mut team = Team::load(serialized_team, context, Keyring::new())?;
        team.join(keyring);
        let chain = Self::from_team(team);
        info!(team_name = %chain.name, "joined sigchain");
        Ok(chain)
    }

    /// Rebuild a chain from its persisted record.
    pub fn from_stored(stored: &StoredChain) -> Result<Self> {
        let context: LocalUserContext = decode(&stored.context)?;
        let keyring: Keyring = decode(&stored.team_keyring)?;
        Self::load(&stored.serialized_team, context, keyring)
    }

    /// Bundle the graph, local context and keyring for storage.
    pub fn serialize(&self) -> Result<StoredChain> {
        let team = self.team();
        Ok(StoredChain {
            serialized_team: team.save()?,
            context: encode(team.context())?,
            team_keyring: encode(&team.team_keyring())?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared access to the team.
    ///
    /// Team mutations are applied atomically, so a panic while the lock was
    /// held cannot leave the team half-updated; a poisoned lock is recovered.
    pub fn team(&self) -> RwLockReadGuard<'_, Team> {
        self.team.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to the team.
    pub fn team_mut(&self) -> RwLockWriteGuard<'_, Team> {
        self.team.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The identity this chain acts as.
    pub fn context(&self) -> LocalUserContext {
        self.team().context().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    pub fn users(&self) -> UserService<'_> {
        UserService::new(self)
    }

    pub fn devices(&self) -> DeviceService<'_> {
        DeviceService::new(self)
    }

    pub fn roles(&self) -> RoleService<'_> {
        RoleService::new(self)
    }

    pub fn channels(&self) -> ChannelService<'_> {
        ChannelService::new(self)
    }

    pub fn invites(&self) -> InviteService<'_> {
        InviteService::new(self)
    }

    pub fn crypto(&self) -> CryptoService<'_> {
        CryptoService::new(self)
    }
}

impl fmt::Debug for SigChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigChain")
            .field("name", &self.name)
            .field("head", &self.team().head())
            .finish()
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| SigChainError::Codec(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| SigChainError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigchain_team::{KeyScope, ADMIN};

    #[test]
    fn test_create_makes_founder_admin_and_member() {
        let chain = SigChain::create("test", "user").unwrap();
        let context = chain.context();

        assert_eq!(chain.name(), "test");
        assert_eq!(context.user.user_name, "user");
        assert!(chain.roles().am_i_member_of_role(&context, ADMIN));
        assert!(chain.roles().am_i_member_of_role(&context, MEMBER));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let chain = SigChain::create("test", "user").unwrap();
        let stored = chain.serialize().unwrap();

        let restored = SigChain::from_stored(&stored).unwrap();
        assert_eq!(restored.name(), "test");
        assert_eq!(restored.context(), chain.context());
        assert_eq!(restored.team().head(), chain.team().head());
        assert!(restored
            .team()
            .team_keyring()
            .contains(&KeyScope::role(MEMBER)));
    }

    #[test]
    fn test_from_stored_rejects_garbage() {
        let stored = StoredChain {
            serialized_team: vec![1, 2, 3],
            context: vec![0xff],
            team_keyring: vec![],
        };
        assert!(matches!(
            SigChain::from_stored(&stored),
            Err(SigChainError::Codec(_))
        ));
    }

    #[test]
    fn test_mutation_visible_through_shared_handle() {
        let chain = std::sync::Arc::new(SigChain::create("test", "user").unwrap());
        let other = chain.clone();

        chain
            .roles()
            .create("ops", PermissionsMap::new(), false)
            .unwrap();
        assert!(other.team().role("ops").is_some());
    }
}
