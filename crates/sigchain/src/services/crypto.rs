//! Encryption and signing on behalf of the local user.
//!
//! Team, role and channel scopes use the symmetric scope key from the
//! keyring. The user scope encrypts directly between the sender's and the
//! recipient's encryption keys. Every payload is signed by the sender.

use serde::{Deserialize, Serialize};

use sigchain_core::{now_millis, UserId};
use sigchain_team::{
    EncryptedEnvelope, KeyScope, Keyset, LocalUserContext, MemberSearchOptions, SignedEnvelope,
};

use crate::chain::SigChain;
use crate::error::{Result, SigChainError};
use crate::services::ChannelService;

/// Who a payload is encrypted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncryptionScopeType {
    Team,
    Role,
    Channel,
    User,
}

/// Target of an encryption.
///
/// `name` is the role name, the channel name or the recipient's user id;
/// it is ignored for the team scope. `generation` is filled in when
/// encrypting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionScope {
    pub scope_type: EncryptionScopeType,
    pub name: Option<String>,
    #[serde(default)]
    pub generation: u32,
}

impl EncryptionScope {
    pub fn team() -> Self {
        Self::new(EncryptionScopeType::Team, None)
    }

    pub fn role(role_name: impl Into<String>) -> Self {
        Self::new(EncryptionScopeType::Role, Some(role_name.into()))
    }

    pub fn channel(channel_name: impl Into<String>) -> Self {
        Self::new(EncryptionScopeType::Channel, Some(channel_name.into()))
    }

    pub fn user(user_id: &UserId) -> Self {
        Self::new(EncryptionScopeType::User, Some(user_id.to_string()))
    }

    fn new(scope_type: EncryptionScopeType, name: Option<String>) -> Self {
        Self {
            scope_type,
            name,
            generation: 0,
        }
    }

    fn required_name(&self) -> Result<&str> {
        self.name.as_deref().ok_or_else(|| {
            SigChainError::InvalidArgument(format!(
                "a scope name is required for {:?} encryption",
                self.scope_type
            ))
        })
    }

    /// The keyring scope of a symmetric encryption scope.
    fn key_scope(&self) -> Result<KeyScope> {
        match self.scope_type {
            EncryptionScopeType::Team => Ok(KeyScope::Team),
            EncryptionScopeType::Role => Ok(KeyScope::role(self.required_name()?)),
            EncryptionScopeType::Channel => Ok(KeyScope::role(
                ChannelService::private_channel_role_name(self.required_name()?),
            )),
            EncryptionScopeType::User => Ok(KeyScope::User(UserId::from(self.required_name()?))),
        }
    }
}

/// Encrypted contents plus the scope they were encrypted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// CBOR-encoded [`EncryptedEnvelope`].
    pub contents: Vec<u8>,
    pub scope: EncryptionScope,
}

/// An encrypted payload with the sender's signature over its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAndSignedPayload {
    pub encrypted: EncryptedPayload,
    pub signature: SignedEnvelope,
    /// Unix millis at encryption time.
    pub ts: i64,
    pub user_name: String,
}

pub struct CryptoService<'a> {
    chain: &'a SigChain,
}

impl<'a> CryptoService<'a> {
    pub(crate) fn new(chain: &'a SigChain) -> Self {
        Self { chain }
    }

    pub fn public_keys_for_members_by_id(
        &self,
        member_ids: &[UserId],
        options: MemberSearchOptions,
    ) -> Result<Vec<Keyset>> {
        Ok(self
            .chain
            .users()
            .users_by_id(member_ids, options)?
            .into_iter()
            .map(|m| m.keys)
            .collect())
    }

    /// Encrypt `message` for `scope` and sign the result.
    pub fn encrypt_and_sign(
        &self,
        message: &[u8],
        scope: &EncryptionScope,
        context: &LocalUserContext,
    ) -> Result<EncryptedAndSignedPayload> {
        self.check_context(context)?;

        let team = self.chain.team();
        let envelope = match scope.scope_type {
            EncryptionScopeType::User => {
                let recipient = UserId::from(scope.required_name()?);
                team.encrypt_for_member(message, &recipient)?
            }
            _ => team.encrypt(message, scope.key_scope()?)?,
        };

        let encrypted = EncryptedPayload {
            contents: envelope.to_bytes()?,
            scope: EncryptionScope {
                generation: envelope.generation,
                ..scope.clone()
            },
        };
        let signature = team.sign(encrypted.contents.clone());

        Ok(EncryptedAndSignedPayload {
            encrypted,
            signature,
            ts: now_millis(),
            user_name: context.user.user_name.clone(),
        })
    }

    /// Verify the signature, then decrypt.
    pub fn decrypt_and_verify(
        &self,
        encrypted: &EncryptedPayload,
        signature: &SignedEnvelope,
        context: &LocalUserContext,
    ) -> Result<Vec<u8>> {
        self.check_context(context)?;

        let team = self.chain.team();
        if signature.contents != encrypted.contents || !team.verify(signature) {
            return Err(SigChainError::InvalidSignature(format!(
                "message from {}",
                signature.author.user_id
            )));
        }

        let envelope = EncryptedEnvelope::from_bytes(&encrypted.contents)?;
        if envelope.scope != encrypted.scope.key_scope()? {
            return Err(SigChainError::InvalidArgument(format!(
                "payload is labelled {:?} but encrypted for {}",
                encrypted.scope, envelope.scope
            )));
        }

        let plaintext = match encrypted.scope.scope_type {
            EncryptionScopeType::User => {
                team.decrypt_from_member(&envelope, &signature.author.user_id)?
            }
            _ => team.decrypt(&envelope)?,
        };
        Ok(plaintext)
    }

    /// The chain only holds secrets for its own user.
    fn check_context(&self, context: &LocalUserContext) -> Result<()> {
        let team = self.chain.team();
        if context.user.user_id != team.context().user.user_id {
            return Err(SigChainError::InvalidArgument(format!(
                "context for {} does not belong to this chain",
                context.user.user_id
            )));
        }
        Ok(())
    }
}
