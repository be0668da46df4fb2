//! Invitations and proofs of invitation.
//!
//! An invitation is derived from a secret seed shared out of band. The seed
//! deterministically yields an Ed25519 keypair; only the public key goes into
//! the graph and the invitation id is a hash of it. Whoever knows the seed
//! can produce a [`ProofOfInvitation`] by signing the id with the derived key.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use sigchain_core::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair, UserId};

use crate::error::{Result, TeamError};

/// Domain-separation context for seed-derived invitation keys.
const INVITATION_KEY_CONTEXT: &str = "sigchain-team-v0 invitation key";

/// Prefix of the message a proof signs.
const PROOF_MESSAGE_PREFIX: &[u8] = b"sigchain-invitation-proof:";

/// Random bytes in a generated seed.
const SEED_BYTES: usize = 10;

/// Options for issuing an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteOptions {
    /// Secret seed; a random one is generated when absent.
    pub seed: Option<String>,
    /// Unix millis after which the invitation is void. 0 means never.
    pub expiration: i64,
    /// Number of admissions allowed. 0 means unlimited.
    pub max_uses: u32,
    /// For device invitations: the user the device will belong to.
    pub user_id: Option<UserId>,
}

impl Default for InviteOptions {
    fn default() -> Self {
        Self {
            seed: None,
            expiration: 0,
            max_uses: 1,
            user_id: None,
        }
    }
}

/// What the inviter gets back: the id to track and the seed to share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteResult {
    pub id: String,
    pub seed: String,
}

/// The public record of an invitation, as stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: String,
    pub public_key: Ed25519PublicKey,
    pub expiration: i64,
    pub max_uses: u32,
    pub user_id: Option<UserId>,
}

impl Invitation {
    /// Build an invitation from options, returning it with its seed.
    pub fn create(options: &InviteOptions) -> (Self, String) {
        let seed = options
            .seed
            .as_deref()
            .map(normalize_seed)
            .unwrap_or_else(generate_seed);
        let public_key = invitation_keypair(&seed).public_key();

        let invitation = Self {
            id: invitation_id(&public_key),
            public_key,
            expiration: options.expiration,
            max_uses: options.max_uses,
            user_id: options.user_id.clone(),
        };
        (invitation, seed)
    }
}

/// Proof that the holder knows an invitation's seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfInvitation {
    pub id: String,
    pub signature: Ed25519Signature,
}

/// An invitation plus its replayed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationState {
    pub invitation: Invitation,
    pub uses: u32,
    pub revoked: bool,
}

impl InvitationState {
    pub fn new(invitation: Invitation) -> Self {
        Self {
            invitation,
            uses: 0,
            revoked: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.invitation.id
    }

    /// Check that `proof` may be redeemed against this invitation at `now`.
    pub fn validate(&self, proof: &ProofOfInvitation, now: i64) -> Result<()> {
        let id = &self.invitation.id;
        if proof.id != *id {
            return Err(TeamError::InvalidProof(format!(
                "proof is for {}, not {}",
                proof.id, id
            )));
        }
        if self.revoked {
            return Err(TeamError::InvitationRevoked(id.clone()));
        }
        if self.invitation.max_uses > 0 && self.uses >= self.invitation.max_uses {
            return Err(TeamError::InvitationUsedUp(id.clone()));
        }
        if self.invitation.expiration > 0 && now > self.invitation.expiration {
            return Err(TeamError::InvitationExpired(id.clone()));
        }

        self.invitation
            .public_key
            .verify(&proof_message(id), &proof.signature)
            .map_err(|_| TeamError::InvalidProof(id.clone()))
    }
}

/// Produce a proof of invitation from a seed.
pub fn generate_proof(seed: &str) -> ProofOfInvitation {
    let keypair = invitation_keypair(&normalize_seed(seed));
    let id = invitation_id(&keypair.public_key());
    let signature = keypair.sign(&proof_message(&id));
    ProofOfInvitation { id, signature }
}

/// Lowercase the seed and drop everything that is not alphanumeric, so
/// that seeds survive being retyped by hand.
pub fn normalize_seed(seed: &str) -> String {
    seed.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Generate a fresh random seed.
pub fn generate_seed() -> String {
    let mut bytes = [0u8; SEED_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn invitation_keypair(normalized_seed: &str) -> Keypair {
    Keypair::derive(INVITATION_KEY_CONTEXT, normalized_seed.as_bytes())
}

fn invitation_id(public_key: &Ed25519PublicKey) -> String {
    hex::encode(&Blake3Hash::hash(public_key.as_bytes()).as_bytes()[..16])
}

fn proof_message(id: &str) -> Vec<u8> {
    let mut message = PROOF_MESSAGE_PREFIX.to_vec();
    message.extend_from_slice(id.as_bytes());
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn invitation(options: InviteOptions) -> (InvitationState, String) {
        let (invitation, seed) = Invitation::create(&options);
        (InvitationState::new(invitation), seed)
    }

    #[test]
    fn test_proof_matches_invitation() {
        let (state, seed) = invitation(InviteOptions::default());
        let proof = generate_proof(&seed);

        assert_eq!(proof.id, state.id());
        assert!(state.validate(&proof, 0).is_ok());
    }

    #[test]
    fn test_seed_is_normalized() {
        let (state, _) = invitation(InviteOptions {
            seed: Some("abcd-efgh-ijkl".into()),
            ..Default::default()
        });

        let proof = generate_proof("ABCD EFGH IJKL");
        assert!(state.validate(&proof, 0).is_ok());
    }

    #[test]
    fn test_wrong_seed_rejected() {
        let (state, _) = invitation(InviteOptions::default());
        let mut proof = generate_proof("some other seed");
        proof.id = state.id().to_string();

        assert!(matches!(
            state.validate(&proof, 0),
            Err(TeamError::InvalidProof(_))
        ));
    }

    #[test]
    fn test_revoked_expired_and_used_up() {
        let (mut state, seed) = invitation(InviteOptions {
            expiration: 1_000,
            max_uses: 2,
            ..Default::default()
        });
        let proof = generate_proof(&seed);

        assert!(state.validate(&proof, 1_000).is_ok());
        assert!(matches!(
            state.validate(&proof, 1_001),
            Err(TeamError::InvitationExpired(_))
        ));

        state.uses = 2;
        assert!(matches!(
            state.validate(&proof, 0),
            Err(TeamError::InvitationUsedUp(_))
        ));

        state.uses = 0;
        state.revoked = true;
        assert!(matches!(
            state.validate(&proof, 0),
            Err(TeamError::InvitationRevoked(_))
        ));
    }

    #[test]
    fn test_unlimited_uses() {
        let (mut state, seed) = invitation(InviteOptions {
            max_uses: 0,
            ..Default::default()
        });
        state.uses = 1_000;
        assert!(state.validate(&generate_proof(&seed), 0).is_ok());
    }

    #[test]
    fn test_generated_seeds_differ() {
        assert_ne!(generate_seed(), generate_seed());
        assert_eq!(generate_seed().len(), SEED_BYTES * 2);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(seed in "\\PC{0,40}") {
            let once = normalize_seed(&seed);
            prop_assert_eq!(normalize_seed(&once), once.clone());
            prop_assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }

        #[test]
        fn prop_retyped_seed_still_proves(seed in "[a-z0-9]{4,20}", sep in "[ -]{0,2}") {
            let (state, _) = invitation(InviteOptions {
                seed: Some(seed.clone()),
                max_uses: 0,
                ..Default::default()
            });

            let retyped: String = seed
                .chars()
                .map(|c| format!("{}{}", c.to_ascii_uppercase(), sep))
                .collect();
            prop_assert!(state.validate(&generate_proof(&retyped), 0).is_ok());
        }
    }
}
