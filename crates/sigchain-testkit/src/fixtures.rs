//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use sigchain::{SigChain, SigChainConfig, SigChainService, UserService, MEMBER};
use sigchain_store::MemoryChainStore;
use sigchain_team::LocalUserContext;

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

/// A fresh user with one device.
pub fn context(user_name: &str) -> LocalUserContext {
    UserService::create_context(user_name, None)
}

/// A registry over an in-memory store.
pub fn memory_service() -> SigChainService<MemoryChainStore> {
    SigChainService::new(MemoryChainStore::new(), SigChainConfig::default())
}

/// A team founded by an admin, ready for more members.
pub struct TeamFixture {
    pub chain: SigChain,
    pub admin: LocalUserContext,
}

impl TeamFixture {
    /// Found `team_name` with an admin named "admin".
    pub fn new(team_name: &str) -> Self {
        let chain = SigChain::create(team_name, "admin")
            .unwrap_or_else(|e| panic!("failed to create team {}: {}", team_name, e));
        let admin = chain.context();
        Self { chain, admin }
    }

    /// Found a team and admit one member per name.
    pub fn with_members(team_name: &str, user_names: &[&str]) -> (Self, Vec<LocalUserContext>) {
        let fixture = Self::new(team_name);
        let members = user_names.iter().map(|name| fixture.admit(name)).collect();
        (fixture, members)
    }

    /// Invite, then admit, a new user with the `member` role.
    pub fn admit(&self, user_name: &str) -> LocalUserContext {
        let invites = self.chain.invites();
        let invite = invites
            .create_user_invite(
                sigchain::services::DEFAULT_INVITATION_VALID_FOR_MS,
                sigchain::services::DEFAULT_MAX_USES,
                None,
            )
            .unwrap_or_else(|e| panic!("failed to invite {}: {}", user_name, e));

        let prospective = UserService::create_from_invite_seed(user_name, &invite.seed);
        let user = &prospective.context.user;
        invites
            .admit_member_from_invite(
                &prospective.invite_proof,
                &user.user_name,
                &user.user_id,
                prospective.public_keys.clone(),
            )
            .unwrap_or_else(|e| panic!("failed to admit {}: {}", user_name, e));

        assert!(self.chain.roles().member_has_role(&user.user_id, MEMBER));
        prospective.context
    }

    /// Open the team as `context` would after receiving the saved graph.
    pub fn open_as(&self, context: LocalUserContext) -> SigChain {
        let serialized = self
            .chain
            .team()
            .save()
            .unwrap_or_else(|e| panic!("failed to save team: {}", e));
        SigChain::join(context, &serialized, &self.chain.team().team_keyring().team_only())
            .unwrap_or_else(|e| panic!("failed to open team: {}", e))
    }
}
