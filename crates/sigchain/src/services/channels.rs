//! Channel-related chain operations.
//!
//! A private channel is a role named [`CHANNEL_ROLE_PREFIX`] followed by the
//! channel name. Channel membership is role membership, and the role key is
//! the channel key.

use tracing::info;

use sigchain_core::UserId;
use sigchain_team::{LocalUserContext, PermissionsMap, Role};

use crate::chain::SigChain;
use crate::error::Result;
use crate::services::RoleView;

/// Prefix of the role backing a private channel.
pub const CHANNEL_ROLE_PREFIX: &str = "priv_chan_";

/// A private channel as seen by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub channel_name: String,
    pub role: RoleView,
}

pub struct ChannelService<'a> {
    chain: &'a SigChain,
}

impl<'a> ChannelService<'a> {
    pub(crate) fn new(chain: &'a SigChain) -> Self {
        Self { chain }
    }

    /// Name of the role backing `channel_name`.
    pub fn private_channel_role_name(channel_name: &str) -> String {
        format!("{}{}", CHANNEL_ROLE_PREFIX, channel_name)
    }

    /// Channel name for a channel role name, or `None` if it is not one.
    pub fn channel_name_from_role_name(role_name: &str) -> Option<&str> {
        role_name.strip_prefix(CHANNEL_ROLE_PREFIX)
    }

    pub fn is_channel_role_name(role_name: &str) -> bool {
        role_name.starts_with(CHANNEL_ROLE_PREFIX)
    }

    pub fn is_channel_role(role: &Role) -> bool {
        Self::is_channel_role_name(&role.role_name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a channel with `context`'s user as its first member.
    pub fn create_private_channel(
        &self,
        channel_name: &str,
        context: &LocalUserContext,
    ) -> Result<Channel> {
        info!(team_name = %self.chain.name(), channel_name, "creating private channel");
        let roles = self.chain.roles();
        roles.create(
            &Self::private_channel_role_name(channel_name),
            PermissionsMap::new(),
            false,
        )?;
        self.add_member_to_private_channel(&context.user.user_id, channel_name)?;
        self.get_channel(channel_name, context)
    }

    pub fn add_member_to_private_channel(&self, user_id: &UserId, channel_name: &str) -> Result<()> {
        self.chain
            .roles()
            .add_member(user_id, &Self::private_channel_role_name(channel_name))
    }

    pub fn revoke_private_channel_membership(
        &self,
        user_id: &UserId,
        channel_name: &str,
    ) -> Result<()> {
        self.chain
            .roles()
            .revoke_membership(user_id, &Self::private_channel_role_name(channel_name))
    }

    pub fn delete_private_channel(&self, channel_name: &str) -> Result<()> {
        info!(team_name = %self.chain.name(), channel_name, "deleting private channel");
        self.chain
            .roles()
            .delete(&Self::private_channel_role_name(channel_name))
    }

    /// Remove `context`'s user from the channel.
    pub fn leave_channel(&self, channel_name: &str, context: &LocalUserContext) -> Result<()> {
        info!(team_name = %self.chain.name(), channel_name, "leaving private channel");
        self.revoke_private_channel_membership(&context.user.user_id, channel_name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_channel(&self, channel_name: &str, context: &LocalUserContext) -> Result<Channel> {
        let role = self
            .chain
            .roles()
            .get_role(&Self::private_channel_role_name(channel_name), context)?;
        Ok(Channel {
            channel_name: channel_name.to_string(),
            role,
        })
    }

    /// All channels, or only those `context`'s user belongs to.
    pub fn get_channels(&self, context: &LocalUserContext, have_access_only: bool) -> Vec<Channel> {
        self.chain
            .roles()
            .get_all_roles(context, have_access_only)
            .into_iter()
            .filter_map(|role| {
                let channel_name = Self::channel_name_from_role_name(role.role_name())?.to_string();
                Some(Channel { channel_name, role })
            })
            .collect()
    }

    pub fn member_in_channel(&self, user_id: &UserId, channel_name: &str) -> bool {
        self.chain
            .roles()
            .member_has_role(user_id, &Self::private_channel_role_name(channel_name))
    }

    pub fn am_i_in_channel(&self, context: &LocalUserContext, channel_name: &str) -> bool {
        self.member_in_channel(&context.user.user_id, channel_name)
    }
}
