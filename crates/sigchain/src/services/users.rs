//! User-related chain operations.

use sigchain_core::UserId;
use sigchain_team::{
    create_user, generate_proof, Keyring, Keyset, LocalUserContext, Member, MemberSearchOptions,
    ProofOfInvitation, User, UserWithSecrets,
};

use crate::chain::SigChain;
use crate::error::Result;
use crate::services::DeviceService;

/// A user generated from an invitation seed, ready to be admitted.
#[derive(Debug, Clone)]
pub struct ProspectiveUser {
    pub context: LocalUserContext,
    pub invite_proof: ProofOfInvitation,
    pub public_keys: Keyset,
}

pub struct UserService<'a> {
    chain: &'a SigChain,
}

impl<'a> UserService<'a> {
    pub(crate) fn new(chain: &'a SigChain) -> Self {
        Self { chain }
    }

    /// Generate a user with an initial device.
    ///
    /// A random user id is generated when `id` is `None`.
    pub fn create_context(name: &str, id: Option<UserId>) -> LocalUserContext {
        let user = create_user(name, id);
        let device = DeviceService::generate_device_for_user(user.user_id.clone());
        LocalUserContext { user, device }
    }

    /// Generate a user plus the proof needed to redeem `seed`.
    pub fn create_from_invite_seed(name: &str, seed: &str) -> ProspectiveUser {
        let context = Self::create_context(name, None);
        let public_keys = Self::redact_user(&context.user).keys;
        ProspectiveUser {
            context,
            invite_proof: generate_proof(seed),
            public_keys,
        }
    }

    pub fn redact_user(user: &UserWithSecrets) -> User {
        user.redact()
    }

    /// Every scope key the local user holds for this team.
    pub fn keys(&self) -> Keyring {
        self.chain.team().team_keyring()
    }

    pub fn all_users(&self) -> Vec<Member> {
        self.chain.team().members().into_iter().cloned().collect()
    }

    pub fn users_by_id(&self, ids: &[UserId], options: MemberSearchOptions) -> Result<Vec<Member>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let team = self.chain.team();
        let members = team.members_by_id(ids, options)?;
        Ok(members.into_iter().cloned().collect())
    }

    pub fn user_by_name(&self, name: &str) -> Option<Member> {
        self.all_users().into_iter().find(|m| m.user_name == name)
    }
}
