//! Role-related chain operations.

use tracing::info;

use sigchain_core::UserId;
use sigchain_team::{LocalUserContext, Member, PermissionsMap, Role, TeamError};

use crate::chain::SigChain;
use crate::error::Result;

/// Permission set on roles whose membership may change after creation.
pub const MODIFIABLE_MEMBERSHIP: &str = "modifiable-membership";

/// A role as seen by one user: its members and whether that user holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleView {
    pub role: Role,
    pub members: Vec<Member>,
    pub has_role: bool,
}

impl RoleView {
    pub fn role_name(&self) -> &str {
        &self.role.role_name
    }
}

pub struct RoleService<'a> {
    chain: &'a SigChain,
}

impl<'a> RoleService<'a> {
    pub(crate) fn new(chain: &'a SigChain) -> Self {
        Self { chain }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a role. Unless `static_membership`, it is marked
    /// [`MODIFIABLE_MEMBERSHIP`].
    pub fn create(
        &self,
        role_name: &str,
        mut permissions: PermissionsMap,
        static_membership: bool,
    ) -> Result<()> {
        info!(team_name = %self.chain.name(), role_name, "adding role");
        if !static_membership {
            permissions.insert(MODIFIABLE_MEMBERSHIP.to_string(), true);
        }
        let role = Role::new(role_name).with_permissions(permissions);
        self.chain.team_mut().add_role(role)?;
        Ok(())
    }

    /// Create a role and add each of `member_ids` to it.
    pub fn create_with_members(
        &self,
        role_name: &str,
        member_ids: &[UserId],
        permissions: PermissionsMap,
        static_membership: bool,
    ) -> Result<()> {
        self.create(role_name, permissions, static_membership)?;
        for member_id in member_ids {
            self.add_member(member_id, role_name)?;
        }
        Ok(())
    }

    pub fn add_member(&self, member_id: &UserId, role_name: &str) -> Result<()> {
        info!(team_name = %self.chain.name(), %member_id, role_name, "adding member to role");
        self.chain.team_mut().add_member_role(member_id, role_name)?;
        Ok(())
    }

    pub fn revoke_membership(&self, member_id: &UserId, role_name: &str) -> Result<()> {
        info!(team_name = %self.chain.name(), %member_id, role_name, "revoking role membership");
        self.chain
            .team_mut()
            .remove_member_role(member_id, role_name)?;
        Ok(())
    }

    pub fn delete(&self, role_name: &str) -> Result<()> {
        info!(team_name = %self.chain.name(), role_name, "removing role");
        self.chain.team_mut().remove_role(role_name)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Look a role up from the point of view of `context`'s user.
    pub fn get_role(&self, role_name: &str, context: &LocalUserContext) -> Result<RoleView> {
        let role = self
            .chain
            .team()
            .role(role_name)
            .cloned()
            .ok_or_else(|| TeamError::RoleNotFound(role_name.to_string()))?;
        Ok(self.view(role, context))
    }

    /// All roles, or only those `context`'s user holds.
    pub fn get_all_roles(&self, context: &LocalUserContext, have_access_only: bool) -> Vec<RoleView> {
        let roles: Vec<Role> = self.chain.team().roles().into_iter().cloned().collect();
        roles
            .into_iter()
            .map(|role| self.view(role, context))
            .filter(|view| !have_access_only || view.has_role)
            .collect()
    }

    pub fn member_has_role(&self, member_id: &UserId, role_name: &str) -> bool {
        self.chain.team().member_has_role(member_id, role_name)
    }

    pub fn am_i_member_of_role(&self, context: &LocalUserContext, role_name: &str) -> bool {
        self.member_has_role(&context.user.user_id, role_name)
    }

    pub fn members_for_role(&self, role_name: &str) -> Vec<Member> {
        self.chain
            .team()
            .members_in_role(role_name)
            .into_iter()
            .cloned()
            .collect()
    }

    fn view(&self, role: Role, context: &LocalUserContext) -> RoleView {
        RoleView {
            members: self.members_for_role(&role.role_name),
            has_role: self.am_i_member_of_role(context, &role.role_name),
            role,
        }
    }
}
