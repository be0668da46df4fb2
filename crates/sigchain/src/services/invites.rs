//! Invite-related chain operations.

use tracing::{info, warn};

use sigchain_core::{now_millis, UserId};
use sigchain_team::{
    generate_proof, Device, InvitationState, InviteOptions, InviteResult, Keyset,
    ProofOfInvitation, User, MEMBER,
};

use crate::chain::SigChain;
use crate::error::Result;

/// Admissions allowed by a default invitation.
pub const DEFAULT_MAX_USES: u32 = 1;

/// Lifetime of a default invitation: one week.
pub const DEFAULT_INVITATION_VALID_FOR_MS: i64 = 604_800_000;

pub struct InviteService<'a> {
    chain: &'a SigChain,
}

impl<'a> InviteService<'a> {
    pub(crate) fn new(chain: &'a SigChain) -> Self {
        Self { chain }
    }

    /// Invite a new member. A random seed is generated when `seed` is `None`.
    pub fn create_user_invite(
        &self,
        valid_for_ms: i64,
        max_uses: u32,
        seed: Option<String>,
    ) -> Result<InviteResult> {
        let options = InviteOptions {
            seed,
            expiration: now_millis() + valid_for_ms,
            max_uses,
            user_id: None,
        };
        let invite = self.chain.team_mut().invite_member(options)?;
        info!(team_name = %self.chain.name(), invitation_id = %invite.id, "created user invite");
        Ok(invite)
    }

    /// Invite a new device for the local user.
    pub fn create_device_invite(&self, valid_for_ms: i64, seed: Option<String>) -> Result<InviteResult> {
        let options = InviteOptions {
            seed,
            expiration: now_millis() + valid_for_ms,
            ..InviteOptions::default()
        };
        let invite = self.chain.team_mut().invite_device(options)?;
        info!(team_name = %self.chain.name(), invitation_id = %invite.id, "created device invite");
        Ok(invite)
    }

    pub fn revoke(&self, id: &str) -> Result<()> {
        info!(team_name = %self.chain.name(), invitation_id = id, "revoking invite");
        self.chain.team_mut().revoke_invitation(id)?;
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Result<InvitationState> {
        Ok(self.chain.team().invitation(id)?.clone())
    }

    pub fn get_all_invites(&self) -> Vec<InvitationState> {
        self.chain
            .team()
            .invitations()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn generate_proof(seed: &str) -> ProofOfInvitation {
        generate_proof(seed)
    }

    /// Whether `proof` could be redeemed right now.
    pub fn validate_proof(&self, proof: &ProofOfInvitation) -> bool {
        match self.chain.team().validate_invitation(proof) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    team_name = %self.chain.name(),
                    invitation_id = %proof.id,
                    error = %e,
                    "proof was invalid or was on an invalid invitation"
                );
                false
            }
        }
    }

    /// Admit the holder of a member invitation.
    pub fn admit_user(
        &self,
        proof: &ProofOfInvitation,
        user_name: &str,
        user_id: &UserId,
        public_keys: Keyset,
    ) -> Result<()> {
        let user = User {
            user_id: user_id.clone(),
            user_name: user_name.to_string(),
            keys: public_keys,
        };
        self.chain.team_mut().admit_member(proof, user)?;
        info!(team_name = %self.chain.name(), %user_id, "admitted user");
        Ok(())
    }

    /// Admit the holder of a member invitation and give them the `member`
    /// role. Returns the user name.
    pub fn admit_member_from_invite(
        &self,
        proof: &ProofOfInvitation,
        user_name: &str,
        user_id: &UserId,
        public_keys: Keyset,
    ) -> Result<String> {
        self.admit_user(proof, user_name, user_id, public_keys)?;
        self.chain.roles().add_member(user_id, MEMBER)?;
        Ok(user_name.to_string())
    }

    pub fn admit_device_from_invite(&self, proof: &ProofOfInvitation, device: Device) -> Result<()> {
        let device_name = device.device_name.clone();
        self.chain.team_mut().admit_device(proof, device)?;
        info!(team_name = %self.chain.name(), device_name, "admitted device");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{DeviceService, UserService};
    use sigchain_team::TeamError;

    #[test]
    fn test_invite_and_admit() {
        let chain = SigChain::create("test", "user").unwrap();
        let invite = chain
            .invites()
            .create_user_invite(DEFAULT_INVITATION_VALID_FOR_MS, DEFAULT_MAX_USES, None)
            .unwrap();
        assert_eq!(chain.invites().get_all_invites().len(), 1);

        let prospective = UserService::create_from_invite_seed("user2", &invite.seed);
        assert!(chain.invites().validate_proof(&prospective.invite_proof));

        let user = &prospective.context.user;
        let name = chain
            .invites()
            .admit_member_from_invite(
                &prospective.invite_proof,
                &user.user_name,
                &user.user_id,
                prospective.public_keys.clone(),
            )
            .unwrap();
        assert_eq!(name, "user2");
        assert!(chain.roles().member_has_role(&user.user_id, MEMBER));

        // Single use.
        assert!(!chain.invites().validate_proof(&prospective.invite_proof));
        assert_eq!(chain.invites().get_by_id(&invite.id).unwrap().uses, 1);
    }

    #[test]
    fn test_revoked_invite_rejected() {
        let chain = SigChain::create("test", "user").unwrap();
        let invite = chain
            .invites()
            .create_user_invite(DEFAULT_INVITATION_VALID_FOR_MS, DEFAULT_MAX_USES, None)
            .unwrap();
        chain.invites().revoke(&invite.id).unwrap();
        assert!(chain.invites().get_by_id(&invite.id).unwrap().revoked);

        let prospective = UserService::create_from_invite_seed("user2", &invite.seed);
        assert!(!chain.invites().validate_proof(&prospective.invite_proof));

        let user = &prospective.context.user;
        let result = chain.invites().admit_user(
            &prospective.invite_proof,
            &user.user_name,
            &user.user_id,
            prospective.public_keys.clone(),
        );
        assert!(matches!(
            result,
            Err(crate::SigChainError::Team(TeamError::InvitationRevoked(_)))
        ));
    }

    #[test]
    fn test_expired_invite_rejected() {
        let chain = SigChain::create("test", "user").unwrap();
        let invite = chain
            .invites()
            .create_user_invite(-1_000, DEFAULT_MAX_USES, None)
            .unwrap();
        let proof = InviteService::generate_proof(&invite.seed);
        assert!(!chain.invites().validate_proof(&proof));
    }

    #[test]
    fn test_device_invite() {
        let chain = SigChain::create("test", "user").unwrap();
        let context = chain.context();
        let invite = chain
            .invites()
            .create_device_invite(DEFAULT_INVITATION_VALID_FOR_MS, Some("device seed".into()))
            .unwrap();
        assert_eq!(invite.seed, "deviceseed");

        let device = DeviceService::generate_device_for_user(context.user.user_id.clone());
        chain
            .invites()
            .admit_device_from_invite(
                &InviteService::generate_proof(&invite.seed),
                DeviceService::redact_device(&device),
            )
            .unwrap();

        let devices = chain.devices().devices_for_user(&context.user.user_id).unwrap();
        assert_eq!(devices.len(), 2);
    }
}
