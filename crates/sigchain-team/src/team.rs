//! Team: a team graph bound to a local user.
//!
//! A `Team` is the unit the application works with. It owns the signed
//! graph, the state replayed from it, the local user's identity and the
//! keyring of scope keys that identity can use. Every mutation is written as
//! a new link signed by the local user and must pass the same authorization
//! checks a peer would apply when replaying it.

use sigchain_core::{now_millis, LinkBuilder, LinkId, TeamGraph, UserId};

use crate::action::TeamAction;
use crate::crypto::{EncryptionKey, X25519PublicKey};
use crate::envelope::{EncryptedEnvelope, SignatureAuthor, SignedEnvelope};
use crate::error::{Result, TeamError};
use crate::invitation::{Invitation, InvitationState, InviteOptions, InviteResult, ProofOfInvitation};
use crate::keyring::{KeyScope, Keyring, ScopedKey};
use crate::lockbox::Lockbox;
use crate::role::{Role, ADMIN};
use crate::state::{Member, MemberSearchOptions, TeamState};
use crate::user::{Device, LocalUserContext, User};

/// Generation of every key created by this crate. Keys are never rotated.
const INITIAL_GENERATION: u32 = 0;

/// One team as seen by the local user.
#[derive(Debug)]
pub struct Team {
    graph: TeamGraph,
    state: TeamState,
    context: LocalUserContext,
    keyring: Keyring,
    joined: bool,
}

impl Team {
    // ────────────────────────────────────────────────────────────────────────
    // Construction & persistence
    // ────────────────────────────────────────────────────────────────────────

    /// Found a new team with the context's user as its first admin.
    pub fn create(team_name: impl Into<String>, context: LocalUserContext) -> Result<Self> {
        let team_name = team_name.into();
        let founder = context.user.redact();

        let team_key = new_scope_key(KeyScope::Team);
        let admin_key = new_scope_key(KeyScope::role(ADMIN));
        let lockboxes = vec![
            Lockbox::seal(&team_key, founder.user_id.clone(), &founder.keys.encryption)?,
            Lockbox::seal(&admin_key, founder.user_id.clone(), &founder.keys.encryption)?,
        ];

        let action = TeamAction::Root {
            team_name: team_name.clone(),
            founder,
            device: context.device.redact(),
            lockboxes,
        };

        let keypair = context.user.keys.signing_keypair();
        let root = LinkBuilder::new(keypair.public_key(), 1)
            .timestamp(now_millis())
            .kind(action.kind())
            .payload(action.to_bytes()?)
            .sign(keypair);

        let mut state = TeamState::default();
        state.apply_link(&root)?;
        let graph = TeamGraph::new(team_name, root)?;

        let mut keyring = Keyring::new();
        for key in [team_key, admin_key] {
            keyring.insert(key.scope, key.generation, key.key);
        }

        Ok(Self {
            graph,
            state,
            context,
            keyring,
            joined: true,
        })
    }

    /// Rebuild a team from bytes produced by [`Team::save`].
    ///
    /// The graph is verified and replayed; any lockboxes addressed to the
    /// local user are opened into the keyring.
    pub fn load(serialized: &[u8], context: LocalUserContext, keyring: Keyring) -> Result<Self> {
        let graph = TeamGraph::from_bytes(serialized)?;
        let state = TeamState::replay(&graph)?;
        let joined = state.has_member(&context.user.user_id);

        let mut team = Self {
            graph,
            state,
            context,
            keyring,
            joined,
        };
        team.open_lockboxes();
        Ok(team)
    }

    /// Accept keys handed over out of band and mark the local user as joined.
    ///
    /// Membership itself is granted by an admin admitting the user.
    pub fn join(&mut self, keyring: &Keyring) {
        self.keyring.merge(keyring);
        self.open_lockboxes();
        self.joined = true;
    }

    /// Serialize the graph.
    pub fn save(&self) -> Result<Vec<u8>> {
        Ok(self.graph.to_bytes()?)
    }

    pub fn team_name(&self) -> &str {
        self.graph.team_name()
    }

    pub fn context(&self) -> &LocalUserContext {
        &self.context
    }

    /// Every scope key the local user holds.
    pub fn team_keyring(&self) -> Keyring {
        self.keyring.clone()
    }

    pub fn graph(&self) -> &TeamGraph {
        &self.graph
    }

    pub fn state(&self) -> &TeamState {
        &self.state
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn head(&self) -> LinkId {
        self.graph.head_id()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Members
    // ────────────────────────────────────────────────────────────────────────

    pub fn members(&self) -> Vec<&Member> {
        self.state.members()
    }

    pub fn members_by_id(
        &self,
        user_ids: &[UserId],
        options: MemberSearchOptions,
    ) -> Result<Vec<&Member>> {
        self.state.members_by_id(user_ids, options)
    }

    pub fn member(&self, user_id: &UserId) -> Result<&Member> {
        self.state
            .member(user_id)
            .ok_or_else(|| TeamError::MemberNotFound(user_id.to_string()))
    }

    pub fn has(&self, user_id: &UserId) -> bool {
        self.state.has_member(user_id)
    }

    /// Add a member directly, without an invitation.
    pub fn add_member(&mut self, user: User) -> Result<()> {
        let team_key = self.scope_key(&KeyScope::Team)?;
        let lockbox = Lockbox::seal(&team_key, user.user_id.clone(), &user.keys.encryption)?;
        self.append(TeamAction::AddMember {
            user,
            lockboxes: vec![lockbox],
        })
    }

    pub fn remove_member(&mut self, user_id: &UserId) -> Result<()> {
        self.append(TeamAction::RemoveMember {
            user_id: user_id.clone(),
        })
    }

    /// Register another device of the local user.
    pub fn add_device(&mut self, device: Device) -> Result<()> {
        self.append(TeamAction::AddDevice { device })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Roles
    // ────────────────────────────────────────────────────────────────────────

    /// Create a role. A fresh role key is sealed to every admin.
    pub fn add_role(&mut self, role: Role) -> Result<()> {
        if self.state.role(&role.role_name).is_some() {
            return Err(TeamError::RoleExists(role.role_name));
        }

        let role_key = new_scope_key(KeyScope::role(role.role_name.clone()));
        let lockboxes = self
            .state
            .members_in_role(ADMIN)
            .into_iter()
            .map(|admin| Lockbox::seal(&role_key, admin.user_id.clone(), &admin.keys.encryption))
            .collect::<Result<Vec<_>>>()?;

        self.append(TeamAction::AddRole { role, lockboxes })
    }

    pub fn remove_role(&mut self, role_name: &str) -> Result<()> {
        self.append(TeamAction::RemoveRole {
            role_name: role_name.to_string(),
        })
    }

    /// Put a member in a role and seal the role key to them.
    pub fn add_member_role(&mut self, user_id: &UserId, role_name: &str) -> Result<()> {
        if self.state.role(role_name).is_none() {
            return Err(TeamError::RoleNotFound(role_name.to_string()));
        }
        let member = self.member(user_id)?;
        let role_key = self.scope_key(&KeyScope::role(role_name))?;
        let lockbox = Lockbox::seal(&role_key, member.user_id.clone(), &member.keys.encryption)?;

        self.append(TeamAction::AddMemberRole {
            user_id: user_id.clone(),
            role_name: role_name.to_string(),
            lockboxes: vec![lockbox],
        })
    }

    pub fn remove_member_role(&mut self, user_id: &UserId, role_name: &str) -> Result<()> {
        self.append(TeamAction::RemoveMemberRole {
            user_id: user_id.clone(),
            role_name: role_name.to_string(),
        })
    }

    pub fn member_has_role(&self, user_id: &UserId, role_name: &str) -> bool {
        self.state.member_has_role(user_id, role_name)
    }

    pub fn members_in_role(&self, role_name: &str) -> Vec<&Member> {
        self.state.members_in_role(role_name)
    }

    pub fn roles(&self) -> Vec<&Role> {
        self.state.roles()
    }

    pub fn role(&self, role_name: &str) -> Option<&Role> {
        self.state.role(role_name)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Invitations
    // ────────────────────────────────────────────────────────────────────────

    /// Invite a new member. Returns the id and the seed to share.
    pub fn invite_member(&mut self, mut options: InviteOptions) -> Result<InviteResult> {
        options.user_id = None;
        let (invitation, seed) = Invitation::create(&options);
        let id = invitation.id.clone();
        self.append(TeamAction::InviteMember { invitation })?;
        Ok(InviteResult { id, seed })
    }

    /// Invite a device for the local user (or `options.user_id`).
    pub fn invite_device(&mut self, mut options: InviteOptions) -> Result<InviteResult> {
        if options.user_id.is_none() {
            options.user_id = Some(self.context.user.user_id.clone());
        }
        let (invitation, seed) = Invitation::create(&options);
        let id = invitation.id.clone();
        self.append(TeamAction::InviteDevice { invitation })?;
        Ok(InviteResult { id, seed })
    }

    pub fn revoke_invitation(&mut self, id: &str) -> Result<()> {
        self.invitation(id)?;
        self.append(TeamAction::RevokeInvitation { id: id.to_string() })
    }

    pub fn invitation(&self, id: &str) -> Result<&InvitationState> {
        self.state
            .invitation(id)
            .ok_or_else(|| TeamError::InvitationNotFound(id.to_string()))
    }

    pub fn invitations(&self) -> Vec<&InvitationState> {
        self.state.invitations()
    }

    /// Check a proof of invitation against the current time.
    pub fn validate_invitation(&self, proof: &ProofOfInvitation) -> Result<()> {
        self.state.validate_invitation(proof, now_millis()).map(|_| ())
    }

    /// Admit the holder of a member invitation, sealing the team key to them.
    pub fn admit_member(&mut self, proof: &ProofOfInvitation, user: User) -> Result<()> {
        self.validate_invitation(proof)?;
        let team_key = self.scope_key(&KeyScope::Team)?;
        let lockbox = Lockbox::seal(&team_key, user.user_id.clone(), &user.keys.encryption)?;

        self.append(TeamAction::AdmitMember {
            proof: proof.clone(),
            user,
            lockboxes: vec![lockbox],
        })
    }

    /// Admit a device invited through [`Team::invite_device`].
    pub fn admit_device(&mut self, proof: &ProofOfInvitation, device: Device) -> Result<()> {
        self.validate_invitation(proof)?;
        self.append(TeamAction::AdmitDevice {
            proof: proof.clone(),
            device,
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Encryption & signatures
    // ────────────────────────────────────────────────────────────────────────

    /// Encrypt for everyone holding the key of `scope`.
    pub fn encrypt(&self, plaintext: &[u8], scope: KeyScope) -> Result<EncryptedEnvelope> {
        EncryptedEnvelope::seal(plaintext, &self.scope_key(&scope)?)
    }

    pub fn decrypt(&self, envelope: &EncryptedEnvelope) -> Result<Vec<u8>> {
        let key = self.scope_key(&envelope.scope)?;
        if key.generation != envelope.generation {
            return Err(TeamError::MissingKey(format!(
                "{} generation {}",
                envelope.scope, envelope.generation
            )));
        }
        envelope.open(&key)
    }

    /// Sign contents as the local user.
    pub fn sign(&self, contents: impl Into<Vec<u8>>) -> SignedEnvelope {
        let user = &self.context.user;
        let author = SignatureAuthor {
            user_id: user.user_id.clone(),
            user_name: user.user_name.clone(),
            signing_key: user.keys.signing_keypair().public_key(),
        };
        SignedEnvelope::sign(contents, author, user.keys.signing_keypair())
    }

    /// Check the signature and that the signing key belongs to the member
    /// named as author.
    pub fn verify(&self, envelope: &SignedEnvelope) -> bool {
        let known_key = self
            .state
            .member(&envelope.author.user_id)
            .map(|m| m.keys.signature == envelope.author.signing_key)
            .unwrap_or(false);
        known_key && envelope.signature_valid()
    }

    /// Encrypt for one member using the local user's and the recipient's
    /// encryption keys.
    pub fn encrypt_for_member(
        &self,
        plaintext: &[u8],
        recipient: &UserId,
    ) -> Result<EncryptedEnvelope> {
        let member = self.member(recipient)?;
        let scope = KeyScope::User(recipient.clone());
        let key = self.pairwise_key(&member.keys.encryption, &scope, member.keys.generation);
        EncryptedEnvelope::seal(plaintext, &key)
    }

    /// Decrypt an envelope `sender` encrypted for the local user.
    pub fn decrypt_from_member(
        &self,
        envelope: &EncryptedEnvelope,
        sender: &UserId,
    ) -> Result<Vec<u8>> {
        let me = &self.context.user.user_id;
        if envelope.scope != KeyScope::User(me.clone()) {
            return Err(TeamError::DecryptionError(format!(
                "envelope is addressed to {}, not {}",
                envelope.scope, me
            )));
        }
        let member = self.member(sender)?;
        let key = self.pairwise_key(&member.keys.encryption, &envelope.scope, envelope.generation);
        envelope.open(&key)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internals
    // ────────────────────────────────────────────────────────────────────────

    /// Sign `action` as the next link, apply it to state and append it.
    fn append(&mut self, action: TeamAction) -> Result<()> {
        let keypair = self.context.user.keys.signing_keypair();
        let link = LinkBuilder::new(keypair.public_key(), self.graph.next_seq())
            .timestamp(now_millis())
            .kind(action.kind())
            .prev(self.graph.head_id())
            .payload(action.to_bytes()?)
            .sign(keypair);

        self.state.apply_link(&link)?;
        if let Err(e) = self.graph.append(link) {
            self.state = TeamState::replay(&self.graph)?;
            return Err(e.into());
        }
        self.open_lockboxes();
        Ok(())
    }

    fn scope_key(&self, scope: &KeyScope) -> Result<ScopedKey> {
        self.keyring
            .get(scope)
            .cloned()
            .ok_or_else(|| TeamError::MissingKey(scope.to_string()))
    }

    fn pairwise_key(
        &self,
        peer: &X25519PublicKey,
        scope: &KeyScope,
        generation: u32,
    ) -> ScopedKey {
        let key = self
            .context
            .user
            .keys
            .encryption_secret()
            .diffie_hellman(peer)
            .derive_encryption_key(scope.label().as_bytes());
        ScopedKey {
            scope: scope.clone(),
            generation,
            key,
        }
    }

    fn open_lockboxes(&mut self) {
        let secret = self.context.user.keys.encryption_secret();
        let public = secret.public_key();
        for lockbox in self.state.lockboxes_for(&public) {
            if self.keyring.contains(&lockbox.scope) {
                continue;
            }
            if let Ok(key) = lockbox.open(&secret) {
                self.keyring.insert(key.scope, key.generation, key.key);
            }
        }
    }
}

fn new_scope_key(scope: KeyScope) -> ScopedKey {
    ScopedKey {
        scope,
        generation: INITIAL_GENERATION,
        key: EncryptionKey::generate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invitation::generate_proof;
    use crate::role::MEMBER;
    use crate::user::{create_device, create_user};

    fn context(name: &str) -> LocalUserContext {
        let user = create_user(name, None);
        let device = create_device(user.user_id.clone(), format!("{}-laptop", name));
        LocalUserContext { user, device }
    }

    #[test]
    fn test_create_makes_founder_admin() {
        let alice = context("alice");
        let team = Team::create("spacecraft", alice.clone()).unwrap();

        assert_eq!(team.team_name(), "spacecraft");
        assert!(team.has(&alice.user.user_id));
        assert!(team.member_has_role(&alice.user.user_id, ADMIN));
        assert!(team.team_keyring().contains(&KeyScope::Team));
        assert!(team.team_keyring().contains(&KeyScope::role(ADMIN)));
        assert!(team.is_joined());
    }

    #[test]
    fn test_roles_and_role_keys() {
        let alice = context("alice");
        let mut team = Team::create("spacecraft", alice.clone()).unwrap();

        team.add_role(Role::new(MEMBER)).unwrap();
        team.add_member_role(&alice.user.user_id, MEMBER).unwrap();

        assert!(team.member_has_role(&alice.user.user_id, MEMBER));
        assert_eq!(team.members_in_role(MEMBER).len(), 1);
        assert!(matches!(
            team.add_role(Role::new(MEMBER)),
            Err(TeamError::RoleExists(_))
        ));

        let envelope = team.encrypt(b"role secret", KeyScope::role(MEMBER)).unwrap();
        assert_eq!(team.decrypt(&envelope).unwrap(), b"role secret");

        team.remove_role(MEMBER).unwrap();
        assert!(team.role(MEMBER).is_none());
        assert!(!team.member_has_role(&alice.user.user_id, MEMBER));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let alice = context("alice");
        let mut team = Team::create("spacecraft", alice.clone()).unwrap();
        team.add_role(Role::new("ops")).unwrap();

        let bytes = team.save().unwrap();
        let loaded = Team::load(&bytes, alice.clone(), Keyring::new()).unwrap();

        assert_eq!(loaded.team_name(), "spacecraft");
        assert_eq!(loaded.head(), team.head());
        assert!(loaded.role("ops").is_some());
        // Keys are recovered from lockboxes.
        assert!(loaded.team_keyring().contains(&KeyScope::Team));
        assert!(loaded.team_keyring().contains(&KeyScope::role("ops")));
    }

    #[test]
    fn test_invitation_admission_flow() {
        let alice = context("alice");
        let mut team = Team::create("spacecraft", alice.clone()).unwrap();

        let invite = team
            .invite_member(InviteOptions {
                max_uses: 1,
                ..Default::default()
            })
            .unwrap();

        let bob = context("bob");
        let proof = generate_proof(&invite.seed);
        team.validate_invitation(&proof).unwrap();
        team.admit_member(&proof, bob.user.redact()).unwrap();

        assert!(team.has(&bob.user.user_id));
        assert!(!team.member_has_role(&bob.user.user_id, ADMIN));
        assert_eq!(team.invitation(&invite.id).unwrap().uses, 1);
        assert!(matches!(
            team.validate_invitation(&proof),
            Err(TeamError::InvitationUsedUp(_))
        ));

        // Bob loads the graph and recovers the team key from his lockbox.
        let mut bobs_team = Team::load(&team.save().unwrap(), bob.clone(), Keyring::new()).unwrap();
        bobs_team.join(&Keyring::new());
        let envelope = team.encrypt(b"welcome", KeyScope::Team).unwrap();
        assert_eq!(bobs_team.decrypt(&envelope).unwrap(), b"welcome");
    }

    #[test]
    fn test_revoked_invitation_rejected() {
        let mut team = Team::create("spacecraft", context("alice")).unwrap();
        let invite = team.invite_member(InviteOptions::default()).unwrap();
        team.revoke_invitation(&invite.id).unwrap();

        let proof = generate_proof(&invite.seed);
        assert!(matches!(
            team.admit_member(&proof, context("bob").user.redact()),
            Err(TeamError::InvitationRevoked(_))
        ));
    }

    #[test]
    fn test_non_admin_cannot_add_role() {
        let alice = context("alice");
        let bob = context("bob");
        let mut team = Team::create("spacecraft", alice).unwrap();
        team.add_member(bob.user.redact()).unwrap();

        let mut bobs_team = Team::load(&team.save().unwrap(), bob, Keyring::new()).unwrap();
        let head = bobs_team.head();

        assert!(matches!(
            bobs_team.add_role(Role::new("sneaky")),
            Err(TeamError::PermissionDenied(_))
        ));
        assert_eq!(bobs_team.head(), head);
    }

    #[test]
    fn test_device_invitation_flow() {
        let alice = context("alice");
        let mut team = Team::create("spacecraft", alice.clone()).unwrap();
        let invite = team.invite_device(InviteOptions::default()).unwrap();

        let phone = create_device(alice.user.user_id.clone(), "alice-phone");
        team.admit_device(&generate_proof(&invite.seed), phone.redact())
            .unwrap();

        let member = team.member(&alice.user.user_id).unwrap();
        assert_eq!(member.devices.len(), 2);
    }

    #[test]
    fn test_sign_and_verify() {
        let alice = context("alice");
        let team = Team::create("spacecraft", alice).unwrap();

        let signed = team.sign(b"hello".to_vec());
        assert!(team.verify(&signed));

        let stranger = Team::create("other", context("mallory")).unwrap();
        assert!(!team.verify(&stranger.sign(b"hello".to_vec())));
    }

    #[test]
    fn test_encrypt_for_member() {
        let alice = context("alice");
        let bob = context("bob");
        let mut team = Team::create("spacecraft", alice.clone()).unwrap();
        team.add_member(bob.user.redact()).unwrap();
        let bobs_team = Team::load(&team.save().unwrap(), bob.clone(), Keyring::new()).unwrap();

        let envelope = team
            .encrypt_for_member(b"just for bob", &bob.user.user_id)
            .unwrap();
        let plaintext = bobs_team
            .decrypt_from_member(&envelope, &alice.user.user_id)
            .unwrap();
        assert_eq!(plaintext, b"just for bob");

        // Alice cannot read it as if it were addressed to her.
        assert!(team
            .decrypt_from_member(&envelope, &bob.user.user_id)
            .is_err());
    }

    #[test]
    fn test_tampered_graph_fails_to_load() {
        let alice = context("alice");
        let mut team = Team::create("spacecraft", alice.clone()).unwrap();
        team.add_role(Role::new("ops")).unwrap();

        let mut bytes = team.save().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;

        assert!(Team::load(&bytes, alice, Keyring::new()).is_err());
    }
}
